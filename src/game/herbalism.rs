//! # Herbalism - Gathering and Identification
//!
//! ```text
//! /gather terrain:forest
//!     attempts left? ──no──▶ refuse
//!         │yes (spend one)
//!     d20 + herbalism bonus = total
//!     terrain_tables["forest"][total] ──miss──▶ "nothing found"
//!         │hit
//!     +1..=4 units of the ingredient
//! ```
//!
//! Identification rolls against `10 + ingredient DC` and is limited to one
//! attempt per ingredient per in-game day.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::check::{Check, CheckModifiers};
use super::clock::PlayerCooldown;
use super::dice::Roller;
use super::errors::{GameError, GameResult};
use super::inventory::Inventories;
use super::stats::PlayerStats;
use crate::logutil::escape_log;

/// Unidentified herb name as it appears in inventories.
pub const UNIDENTIFIED_COMMON: &str = "Common Ingredient";

/// What an unidentified common herb can turn out to be.
pub const COMMON_INGREDIENTS: [&str; 4] = [
    "Wild Sageroot",
    "Mandrake Root",
    "Bloodgrass",
    "Milkweed Seeds",
];

fn common_rarity() -> String {
    "Common".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default = "common_rarity")]
    pub rarity: String,
    #[serde(default)]
    pub effect: String,
    #[serde(rename = "DC", alias = "dc", default)]
    pub dc: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<u32>,
}

/// `ingredients.json`.
pub type IngredientTable = BTreeMap<String, Ingredient>;

/// `terrain_tables.json`: terrain to roll total (as a string) to ingredient.
pub type TerrainTables = BTreeMap<String, BTreeMap<String, String>>;

/// Case-insensitive lookup returning the canonical name.
pub fn find_ingredient<'a>(table: &'a IngredientTable, name: &str) -> Option<(&'a str, &'a Ingredient)> {
    let wanted = name.trim().to_lowercase();
    table
        .iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .map(|(k, v)| (k.as_str(), v))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub ingredient: String,
    pub quantity: u32,
    pub rarity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherReport {
    pub terrain: String,
    pub roll: i64,
    pub modifiers: CheckModifiers,
    pub found: Option<Found>,
    pub attempts_left: u32,
}

impl GatherReport {
    pub fn total(&self) -> i64 {
        self.roll.saturating_add(self.modifiers.total())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyReport {
    pub ingredient: String,
    pub effect: String,
    pub check: Check,
    /// An unidentified unit was held and swapped for the named ingredient.
    pub swapped: bool,
}

impl IdentifyReport {
    pub fn success(&self) -> bool {
        self.check.outcome.is_success()
    }
}

/// Rules and reference tables for gathering and identifying.
pub struct Herbalist<'a> {
    pub ingredients: &'a IngredientTable,
    pub terrains: &'a TerrainTables,
    pub tool_bonus: i64,
}

impl<'a> Herbalist<'a> {
    /// Terrain names in table order, for the selection prompt.
    pub fn terrain_names(&self) -> Vec<&'a str> {
        self.terrains.keys().map(|k| k.as_str()).collect()
    }

    /// Spend one attempt and search `terrain`. An unknown terrain is refused
    /// before any attempt is spent.
    #[allow(clippy::too_many_arguments)]
    pub fn gather(
        &self,
        player: &str,
        terrain: &str,
        stats: &PlayerStats,
        cooldown: &mut PlayerCooldown,
        inventory: &mut Inventories,
        now_hour: u64,
        roller: &mut dyn Roller,
    ) -> GameResult<GatherReport> {
        if self.terrains.is_empty() {
            return Err(GameError::NotFound(
                "no terrain data found; an admin should update terrain_tables.json".into(),
            ));
        }
        let wanted = terrain.trim().to_lowercase();
        let (terrain_name, table) = self
            .terrains
            .iter()
            .find(|(k, _)| k.to_lowercase() == wanted)
            .ok_or_else(|| GameError::NotFound(format!("invalid terrain selection: {}", terrain)))?;

        if !cooldown.take_gather_attempt(now_hour) {
            return Err(GameError::NotReady(
                "you have no gathering attempts left; wait for more in-game time to pass".into(),
            ));
        }

        let modifiers = CheckModifiers::herbalism(stats, self.tool_bonus);
        let roll = roller.d20();
        let total = roll.saturating_add(modifiers.total());

        let found = match table.get(&total.to_string()) {
            Some(name) if name != "Nothing found" => {
                let quantity = roller.range(1, 4) as u32;
                let rarity = self
                    .ingredients
                    .get(name)
                    .map(|i| i.rarity.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                inventory.add(player, name, quantity);
                Some(Found {
                    ingredient: name.clone(),
                    quantity,
                    rarity,
                })
            }
            _ => None,
        };

        info!(
            "{} rolled {} = {} + {} in {}; found {}",
            escape_log(player),
            total,
            roll,
            modifiers,
            escape_log(terrain_name),
            found
                .as_ref()
                .map(|f| format!("{}x {}", f.quantity, f.ingredient))
                .unwrap_or_else(|| "nothing".into())
        );

        Ok(GatherReport {
            terrain: terrain_name.clone(),
            roll,
            modifiers,
            found,
            attempts_left: cooldown.gather_attempts,
        })
    }

    /// Try to identify an herb. Both success and failure use up the day's
    /// attempt for that name.
    #[allow(clippy::too_many_arguments)]
    pub fn identify(
        &self,
        player: &str,
        name: &str,
        stats: &PlayerStats,
        cooldown: &mut PlayerCooldown,
        inventory: &mut Inventories,
        today: u64,
        roller: &mut dyn Roller,
    ) -> GameResult<IdentifyReport> {
        let asked = name.trim().to_lowercase();
        let (identified, unidentified) = if asked.contains("common ingredient") {
            let pick = COMMON_INGREDIENTS[roller.pick(COMMON_INGREDIENTS.len())];
            (pick.to_string(), UNIDENTIFIED_COMMON.to_string())
        } else {
            let (canonical, _) = find_ingredient(self.ingredients, &asked)
                .ok_or_else(|| GameError::NotFound("that ingredient does not exist in my records".into()))?;
            (canonical.to_string(), canonical.to_string())
        };

        let data = self.ingredients.get(&identified).ok_or_else(|| {
            log::error!("{} matched by name but is missing from ingredients.json", identified);
            GameError::NotFound("I can't seem to find details on this ingredient; check your spelling".into())
        })?;

        if !cooldown.can_identify(&asked, today) {
            return Err(GameError::NotReady(format!(
                "you have already attempted to identify {} today; try again tomorrow",
                asked
            )));
        }

        let check = Check::roll(roller, CheckModifiers::herbalism(stats, self.tool_bonus), data.dc.saturating_add(10));
        cooldown.record_identify(&asked, today);

        let mut swapped = false;
        if check.outcome.is_success() && inventory.remove(player, &unidentified, 1) > 0 {
            inventory.add(player, &identified, 1);
            swapped = true;
        }
        info!(
            "{} rolled {} vs DC {} to identify {}: {:?}",
            escape_log(player),
            check.total(),
            check.dc,
            escape_log(&identified),
            check.outcome
        );

        Ok(IdentifyReport {
            ingredient: identified,
            effect: data.effect.clone(),
            check,
            swapped,
        })
    }
}
