//! Chat replies: plain text, embeds, and splitting to the chat limits.
//!
//! Limits are counted in characters, not bytes, because that is how chat
//! clients measure them.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add `value` as one or more fields of at most `limit` characters.
    /// Later parts are titled `"<name> (Part N)"`.
    pub fn split_field(mut self, name: &str, value: &str, limit: usize) -> Self {
        for (index, chunk) in split_text(value, limit).into_iter().enumerate() {
            let title = if index == 0 {
                name.to_string()
            } else {
                format!("{} (Part {})", name, index + 1)
            };
            self = self.field(title, chunk);
        }
        self
    }
}

impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "== {} ==", self.title)?;
        if let Some(desc) = &self.description {
            write!(f, "\n{}", desc)?;
        }
        for field in &self.fields {
            write!(f, "\n\n[{}]\n{}", field.name, field.value)?;
        }
        Ok(())
    }
}

/// One message sent back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub embed: Option<Embed>,
    /// Only the caller sees it.
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
            ephemeral: true,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Self::default()
        }
    }

    /// Plain-text rendering for the console front end.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.ephemeral {
            out.push_str("(only you can see this) ");
        }
        out.push_str(&self.content);
        if let Some(embed) = &self.embed {
            if !self.content.is_empty() {
                out.push('\n');
            }
            out.push_str(&embed.to_string());
        }
        out
    }
}

/// Split text into chunks of at most `limit` characters, preferring line
/// breaks and cutting inside a line only when the line alone is too long.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for line in text.split('\n') {
        let line_len = line.chars().count();
        let sep = usize::from(!current.is_empty());
        if current_len + sep + line_len <= limit {
            if sep == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += sep + line_len;
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        let mut pieces = chars.chunks(limit).map(|c| c.iter().collect::<String>()).peekable();
        while let Some(piece) = pieces.next() {
            if pieces.peek().is_some() {
                chunks.push(piece);
            } else {
                current_len = piece.chars().count();
                current = piece;
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Pack whole lines into messages of at most `limit` characters.
pub fn paginate<S: AsRef<str>>(lines: &[S], limit: usize) -> Vec<String> {
    split_text(
        &lines.iter().map(|l| l.as_ref()).collect::<Vec<_>>().join("\n"),
        limit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("hello", 10), vec!["hello"]);
        assert_eq!(split_text("", 10), vec![""]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_text(text, 9), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn long_line_is_cut_by_characters() {
        let text = "🌿".repeat(25);
        let chunks = split_text(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn every_chunk_respects_limit() {
        let lines: Vec<String> = (0..300).map(|i| format!("🔹 **Item {}** (x{})", i, i)).collect();
        let pages = paginate(&lines, 2000);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.chars().count() <= 2000);
        }
        assert_eq!(pages.join("\n").lines().count(), 300);
    }

    #[test]
    fn split_field_names_later_parts() {
        let value = (0..100).map(|i| format!("**/command_{}** - does a thing", i)).collect::<Vec<_>>().join("\n");
        let embed = Embed::new("Help").split_field("🧪 General Commands", &value, 1024);
        assert!(embed.fields.len() > 1);
        assert_eq!(embed.fields[0].name, "🧪 General Commands");
        assert_eq!(embed.fields[1].name, "🧪 General Commands (Part 2)");
        assert!(embed.fields.iter().all(|f| f.value.chars().count() <= 1024));
    }

    #[test]
    fn render_marks_private_replies() {
        assert_eq!(Reply::private("hi").render(), "(only you can see this) hi");
        let r = Reply::embed(Embed::new("T").description("d").field("F", "v"));
        assert_eq!(r.render(), "== T ==\nd\n\n[F]\nv");
    }
}
