//! In-game time and per-player cooldowns.
//!
//! The clock only moves when an admin runs `/advance_time`. Every day
//! rollover refills each player's gather attempts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_GATHER_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InGameTime {
    #[serde(default)]
    pub days: u64,
    #[serde(default)]
    pub hours: u64,
}

impl InGameTime {
    /// Move the clock forward, rolling whole days out of the hour counter.
    /// Returns the number of day boundaries crossed.
    pub fn advance(&mut self, hours: u64) -> u64 {
        let before = self.days;
        self.hours = self.hours.saturating_add(hours);
        if self.hours >= 24 {
            self.days = self.days.saturating_add(self.hours / 24);
            self.hours %= 24;
        }
        self.days - before
    }

    pub fn total_hours(&self) -> u64 {
        self.days.saturating_mul(24).saturating_add(self.hours)
    }
}

fn default_attempts() -> u32 {
    DEFAULT_GATHER_ATTEMPTS
}

fn never() -> i64 {
    -999
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCooldown {
    #[serde(default = "default_attempts")]
    pub gather_attempts: u32,
    #[serde(default = "never")]
    pub last_gather_hour: i64,
    /// `identify_<name>_day` keys, stored flat alongside the other fields.
    #[serde(flatten)]
    pub identify_days: BTreeMap<String, i64>,
}

impl PlayerCooldown {
    pub fn new(attempts: u32) -> Self {
        Self {
            gather_attempts: attempts,
            last_gather_hour: never(),
            identify_days: BTreeMap::new(),
        }
    }

    fn identify_key(ingredient: &str) -> String {
        format!("identify_{}_day", ingredient.trim().to_lowercase())
    }

    /// At most one identify attempt per ingredient per in-game day.
    pub fn can_identify(&self, ingredient: &str, today: u64) -> bool {
        match self.identify_days.get(&Self::identify_key(ingredient)) {
            Some(last) => (today as i64) - *last >= 1,
            None => true,
        }
    }

    pub fn record_identify(&mut self, ingredient: &str, today: u64) {
        self.identify_days
            .insert(Self::identify_key(ingredient), today as i64);
    }

    /// Spend one gather attempt. False when none remain.
    pub fn take_gather_attempt(&mut self, now_hour: u64) -> bool {
        if self.gather_attempts == 0 {
            return false;
        }
        self.gather_attempts -= 1;
        self.last_gather_hour = now_hour as i64;
        true
    }
}

/// `player_cooldowns.json`: player id to cooldown record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cooldowns(BTreeMap<String, PlayerCooldown>);

impl Cooldowns {
    /// The player's record, created with a full set of attempts on first use.
    pub fn entry(&mut self, player: &str, attempts: u32) -> &mut PlayerCooldown {
        self.0
            .entry(player.to_string())
            .or_insert_with(|| PlayerCooldown::new(attempts))
    }

    pub fn get(&self, player: &str) -> Option<&PlayerCooldown> {
        self.0.get(player)
    }

    /// Refill every player's gather attempts. Called on day rollover.
    pub fn reset_gather_attempts(&mut self, attempts: u32) -> usize {
        for cd in self.0.values_mut() {
            cd.gather_attempts = attempts;
        }
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_rolls_hours_into_days() {
        let mut t = InGameTime { days: 0, hours: 20 };
        assert_eq!(t.advance(3), 0);
        assert_eq!(t, InGameTime { days: 0, hours: 23 });
        assert_eq!(t.advance(50), 2);
        assert_eq!(t, InGameTime { days: 2, hours: 1 });
    }

    #[test]
    fn new_players_start_with_full_attempts() {
        let mut cds = Cooldowns::default();
        let cd = cds.entry("1", 3);
        assert!(cd.take_gather_attempt(5));
        assert!(cd.take_gather_attempt(5));
        assert!(cd.take_gather_attempt(6));
        assert!(!cd.take_gather_attempt(7));
        assert_eq!(cds.reset_gather_attempts(3), 1);
        assert_eq!(cds.get("1").unwrap().gather_attempts, 3);
    }

    #[test]
    fn identify_once_per_day() {
        let mut cd = PlayerCooldown::new(3);
        assert!(cd.can_identify("Bloodgrass", 4));
        cd.record_identify("Bloodgrass", 4);
        assert!(!cd.can_identify("bloodgrass", 4));
        assert!(cd.can_identify("Bloodgrass", 5));
    }

    #[test]
    fn identify_keys_are_stored_flat() {
        let mut cd = PlayerCooldown::new(2);
        cd.record_identify("Mandrake Root", 1);
        let json = serde_json::to_value(&cd).unwrap();
        assert_eq!(json["identify_mandrake root_day"], 1);
        assert_eq!(json["gather_attempts"], 2);

        let parsed: PlayerCooldown = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, cd);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cd: PlayerCooldown = serde_json::from_str("{}").unwrap();
        assert_eq!(cd.gather_attempts, DEFAULT_GATHER_ATTEMPTS);
        assert_eq!(cd.last_gather_hour, -999);
    }
}
