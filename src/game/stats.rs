//! Player ability modifiers and tool proficiencies, shared by both personas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::errors::{GameError, GameResult};

/// Accepted range for ability modifiers.
pub const MODIFIER_RANGE: RangeInclusive<i64> = -10..=30;
/// Accepted range for the proficiency bonus.
pub const PROFICIENCY_RANGE: RangeInclusive<i64> = 0..=10;

/// Refuse a value outside `range`, naming the stat in the refusal.
pub fn check_range(name: &str, value: i64, range: RangeInclusive<i64>) -> GameResult<i64> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(GameError::InvalidArgument(format!(
            "`{}` must be between {} and {}",
            name,
            range.start(),
            range.end()
        )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default, alias = "intelligence")]
    pub intelligence_mod: i64,
    #[serde(default, alias = "wisdom")]
    pub wisdom_mod: i64,
    #[serde(default, alias = "proficiency")]
    pub proficiency_bonus: i64,
    /// Proficient in both herbalism and alchemy.
    #[serde(default)]
    pub proficient: bool,
    #[serde(default)]
    pub herbalism_kit: bool,
    #[serde(default)]
    pub alchemist_tools: bool,
    #[serde(default, alias = "charisma")]
    pub charisma_mod: i64,
    #[serde(default)]
    pub proficient_persuasion: bool,
}

impl PlayerStats {
    /// Better of the intelligence and wisdom modifiers.
    pub fn best_mental_mod(&self) -> i64 {
        self.intelligence_mod.max(self.wisdom_mod)
    }

    /// Proficiency bonus, or 0 when not proficient.
    pub fn applied_proficiency(&self) -> i64 {
        if self.proficient {
            self.proficiency_bonus
        } else {
            0
        }
    }
}

/// `player_stats.json`: player id to stats.
pub type StatsTable = BTreeMap<String, PlayerStats>;

/// Stats for a player, or all zeros when they have never set any.
pub fn stats_for(table: &StatsTable, player: &str) -> PlayerStats {
    table.get(player).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_key_spellings_are_accepted() {
        let s: PlayerStats = serde_json::from_str(
            r#"{"intelligence": 3, "wisdom": 1, "proficiency": 2, "proficient": true, "charisma": -1}"#,
        )
        .unwrap();
        assert_eq!(s.intelligence_mod, 3);
        assert_eq!(s.wisdom_mod, 1);
        assert_eq!(s.proficiency_bonus, 2);
        assert_eq!(s.charisma_mod, -1);
        assert_eq!(s.best_mental_mod(), 3);
        assert_eq!(s.applied_proficiency(), 2);
    }

    #[test]
    fn ranges_bound_modifiers_and_proficiency() {
        assert_eq!(check_range("wisdom", -10, MODIFIER_RANGE).unwrap(), -10);
        assert_eq!(check_range("wisdom", 30, MODIFIER_RANGE).unwrap(), 30);
        assert!(check_range("wisdom", 31, MODIFIER_RANGE).is_err());
        assert!(check_range("proficiency", -1, PROFICIENCY_RANGE).is_err());
        let err = check_range("intelligence", i64::MAX, MODIFIER_RANGE).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: `intelligence` must be between -10 and 30");
    }

    #[test]
    fn unknown_player_gets_zeroed_stats() {
        let table = StatsTable::new();
        assert_eq!(stats_for(&table, "nobody"), PlayerStats::default());
    }
}
