//! # d20 Check Resolution
//!
//! Every randomized action (crafting, gathering, identifying, Basil's own
//! brewing) resolves through the same four-branch rule:
//!
//! ```text
//!   raw d20 == 1   → CriticalFailure   (always, whatever the modifiers)
//!   raw d20 == 20  → CriticalSuccess   (always, whatever the DC)
//!   roll + mods ≥ DC → Success
//!   otherwise      → Failure
//! ```
//!
//! [`resolve`] is pure; [`Check::roll`] draws the die from a [`Roller`].

use super::dice::Roller;
use super::stats::PlayerStats;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl CheckOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, CheckOutcome::Success | CheckOutcome::CriticalSuccess)
    }
}

/// Apply the four-branch rule to a raw d20 value.
pub fn resolve(roll: i64, modifier: i64, dc: i64) -> CheckOutcome {
    match roll {
        1 => CheckOutcome::CriticalFailure,
        20 => CheckOutcome::CriticalSuccess,
        _ if roll.saturating_add(modifier) >= dc => CheckOutcome::Success,
        _ => CheckOutcome::Failure,
    }
}

/// Breakdown of the bonus added to a d20, kept for log lines and replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckModifiers {
    pub stat: i64,
    pub proficiency: i64,
    pub tool: i64,
}

impl CheckModifiers {
    pub fn flat(bonus: i64) -> Self {
        Self {
            stat: bonus,
            proficiency: 0,
            tool: 0,
        }
    }

    /// Crafting: best of INT/WIS, proficiency, alchemist's tools.
    pub fn alchemy(stats: &PlayerStats, tool_bonus: i64) -> Self {
        Self {
            stat: stats.best_mental_mod(),
            proficiency: stats.applied_proficiency(),
            tool: if stats.alchemist_tools { tool_bonus } else { 0 },
        }
    }

    /// Gathering and identifying: best of INT/WIS, proficiency, herbalism kit.
    pub fn herbalism(stats: &PlayerStats, tool_bonus: i64) -> Self {
        Self {
            stat: stats.best_mental_mod(),
            proficiency: stats.applied_proficiency(),
            tool: if stats.herbalism_kit { tool_bonus } else { 0 },
        }
    }

    pub fn total(&self) -> i64 {
        self.stat
            .saturating_add(self.proficiency)
            .saturating_add(self.tool)
    }
}

impl fmt::Display for CheckModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (stat) + {} (prof) + {} (tool)",
            self.stat, self.proficiency, self.tool
        )
    }
}

/// A rolled and resolved check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub roll: i64,
    pub modifiers: CheckModifiers,
    pub dc: i64,
    pub outcome: CheckOutcome,
}

impl Check {
    pub fn roll(roller: &mut dyn Roller, modifiers: CheckModifiers, dc: i64) -> Self {
        let roll = roller.d20();
        Self {
            roll,
            modifiers,
            dc,
            outcome: resolve(roll, modifiers.total(), dc),
        }
    }

    pub fn total(&self) -> i64 {
        self.roll.saturating_add(self.modifiers.total())
    }
}
