//! Helpers that keep player-supplied text from breaking single-line logs.
//!
//! Item names, display names and raw command lines all come from chat, so
//! anything logged from them goes through [`escape_log`] first.

use std::fmt::Write;

/// Longest preview kept in a log line.
pub const MAX_PREVIEW: usize = 200;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\xNN`
///
/// Input longer than [`MAX_PREVIEW`] characters ends in an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// `name (id)` for log lines about a caller.
pub fn caller_label(user_id: &str, display_name: &str) -> String {
    if display_name.is_empty() || display_name == user_id {
        escape_log(user_id)
    } else {
        format!("{} ({})", escape_log(display_name), escape_log(user_id))
    }
}
