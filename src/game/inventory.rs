//! Shared player inventories (`player_inventories.json`).
//!
//! Both personas read and write the same document, so an herb gathered with
//! Basil can be sold to Stanley. Quantities never go below zero and an entry
//! that reaches zero is removed.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::logutil::escape_log;

/// One player's items: name to quantity.
pub type Bag = BTreeMap<String, u32>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventories(BTreeMap<String, Bag>);

impl Inventories {
    pub fn bag(&self, player: &str) -> Option<&Bag> {
        self.0.get(player).filter(|b| !b.is_empty())
    }

    pub fn quantity(&self, player: &str, item: &str) -> u32 {
        self.0
            .get(player)
            .and_then(|b| b.get(item))
            .copied()
            .unwrap_or(0)
    }

    /// Exact stored name of a held item, matched case-insensitively.
    pub fn find_name(&self, player: &str, item: &str) -> Option<String> {
        let wanted = item.trim().to_lowercase();
        self.0.get(player).and_then(|b| {
            b.iter()
                .find(|(name, qty)| **qty > 0 && name.to_lowercase() == wanted)
                .map(|(name, _)| name.clone())
        })
    }

    pub fn add(&mut self, player: &str, item: &str, qty: u32) {
        if qty == 0 {
            return;
        }
        let slot = self
            .0
            .entry(player.to_string())
            .or_default()
            .entry(item.to_string())
            .or_insert(0);
        *slot = slot.saturating_add(qty);
        info!("Added {}x {} to {}'s inventory", qty, escape_log(item), escape_log(player));
    }

    /// Remove up to `qty`, flooring at zero. Returns how many were actually removed.
    pub fn remove(&mut self, player: &str, item: &str, qty: u32) -> u32 {
        let Some(bag) = self.0.get_mut(player) else {
            warn!("Remove of {} from {} failed: no inventory", escape_log(item), escape_log(player));
            return 0;
        };
        let Some(slot) = bag.get_mut(item) else {
            warn!("Remove of {} from {} failed: not held", escape_log(item), escape_log(player));
            return 0;
        };
        let removed = qty.min(*slot);
        *slot -= removed;
        if *slot == 0 {
            bag.remove(item);
        }
        info!("Removed {}x {} from {}'s inventory", removed, escape_log(item), escape_log(player));
        removed
    }

    /// True when the player holds at least one of the base and of every modifier.
    pub fn has_ingredients(&self, player: &str, base: &str, modifiers: &[String]) -> bool {
        self.quantity(player, base) > 0 && modifiers.iter().all(|m| self.quantity(player, m) > 0)
    }

    /// Consume one of the base and one of each modifier.
    pub fn consume_ingredients(&mut self, player: &str, base: &str, modifiers: &[String]) {
        self.remove(player, base, 1);
        for m in modifiers {
            self.remove(player, m, 1);
        }
    }

    pub fn clear(&mut self, player: &str) -> bool {
        self.0.remove(player).is_some()
    }

    pub fn players(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_floors_at_zero_and_drops_entry() {
        let mut inv = Inventories::default();
        inv.add("1", "Bloodgrass", 2);
        assert_eq!(inv.remove("1", "Bloodgrass", 5), 2);
        assert_eq!(inv.quantity("1", "Bloodgrass"), 0);
        assert!(inv.bag("1").is_none());
    }

    #[test]
    fn remove_of_missing_item_is_a_noop() {
        let mut inv = Inventories::default();
        assert_eq!(inv.remove("1", "Rope", 1), 0);
        inv.add("1", "Torch", 1);
        assert_eq!(inv.remove("1", "Rope", 1), 0);
        assert_eq!(inv.quantity("1", "Torch"), 1);
    }

    #[test]
    fn ingredient_check_requires_every_modifier() {
        let mut inv = Inventories::default();
        inv.add("1", "Wild Sageroot", 1);
        inv.add("1", "Bloodgrass", 1);
        let mods = vec!["Bloodgrass".to_string(), "Mandrake Root".to_string()];
        assert!(!inv.has_ingredients("1", "Wild Sageroot", &mods));
        inv.add("1", "Mandrake Root", 1);
        assert!(inv.has_ingredients("1", "Wild Sageroot", &mods));
        inv.consume_ingredients("1", "Wild Sageroot", &mods);
        assert!(inv.bag("1").is_none());
    }

    #[test]
    fn find_name_is_case_insensitive() {
        let mut inv = Inventories::default();
        inv.add("1", "Rope (50 feet)", 1);
        assert_eq!(inv.find_name("1", "rope (50 FEET)").as_deref(), Some("Rope (50 feet)"));
        assert_eq!(inv.find_name("1", "rope"), None);
    }

    #[test]
    fn serializes_as_plain_nested_map() {
        let mut inv = Inventories::default();
        inv.add("7", "Torch", 3);
        let json = serde_json::to_string(&inv).unwrap();
        assert_eq!(json, r#"{"7":{"Torch":3}}"#);
    }
}
