//! Basil's ingredient market (`market.json`).
//!
//! Prices are rolled once per refresh period from the ingredient's rarity and
//! stay fixed until the next refresh. Players pay the listed price in gold
//! pieces; selling back pays the quote, which is adjusted by charisma.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::alchemy::CraftedStock;
use super::currency::Coins;
use super::dice::Roller;
use super::errors::{GameError, GameResult};
use super::gold::GoldBook;
use super::herbalism::IngredientTable;
use super::inventory::Inventories;
use super::stats::PlayerStats;
use crate::logutil::escape_log;

/// Base price for an item with no market entry and no listed price.
pub const FALLBACK_PRICE_GP: u32 = 10;

pub const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Inclusive gold price range for a rarity; unknown rarities price as Common.
pub fn price_range(rarity: &str) -> (i64, i64) {
    match rarity {
        "Uncommon" => (15, 30),
        "Rare" => (30, 50),
        "Very Rare" => (50, 100),
        _ => (5, 15),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub base_price: u32,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Unix seconds of the last regeneration.
    #[serde(default)]
    pub last_update: f64,
    #[serde(flatten)]
    pub items: BTreeMap<String, MarketEntry>,
}

impl Market {
    /// Fresh prices and stock for every known ingredient.
    pub fn generate(ingredients: &IngredientTable, now: f64, roller: &mut dyn Roller) -> Self {
        let mut items = BTreeMap::new();
        for (name, data) in ingredients {
            let (lo, hi) = price_range(&data.rarity);
            items.insert(
                name.clone(),
                MarketEntry {
                    base_price: roller.range(lo, hi) as u32,
                    stock: roller.range(1, 5) as u32,
                },
            );
        }
        info!("Generated market with {} ingredients", items.len());
        Market {
            last_update: now,
            items,
        }
    }

    pub fn is_stale(&self, now: f64, refresh_days: u32) -> bool {
        now - self.last_update > refresh_days as f64 * SECONDS_PER_DAY
    }

    /// Regenerate when older than the refresh period. Returns true when regenerated.
    pub fn refresh_if_stale(
        &mut self,
        ingredients: &IngredientTable,
        now: f64,
        refresh_days: u32,
        roller: &mut dyn Roller,
    ) -> bool {
        if !self.is_stale(now, refresh_days) {
            return false;
        }
        info!("Market prices refreshed after {} days", refresh_days);
        *self = Market::generate(ingredients, now, roller);
        true
    }

    /// Canonical item name, matched case-insensitively.
    pub fn find_name(&self, item: &str) -> Option<String> {
        let wanted = item.trim().to_lowercase();
        self.items.keys().find(|k| k.to_lowercase() == wanted).cloned()
    }

    pub fn stock(&self, item: &str) -> u32 {
        self.items.get(item).map(|e| e.stock).unwrap_or(0)
    }

    /// Basil's own supply check before he brews.
    pub fn has_ingredients(&self, base: &str, modifiers: &[String]) -> bool {
        self.stock(base) > 0 && modifiers.iter().all(|m| self.stock(m) > 0)
    }

    /// Take one of each input from stock, flooring at zero.
    pub fn consume(&mut self, base: &str, modifiers: &[String]) {
        for name in std::iter::once(base).chain(modifiers.iter().map(String::as_str)) {
            if let Some(entry) = self.items.get_mut(name) {
                entry.stock = entry.stock.saturating_sub(1);
            }
        }
    }

    /// Base price for selling or quoting an item.
    pub fn base_price(&self, item: &str, ingredients: &IngredientTable) -> u32 {
        self.items
            .get(item)
            .map(|e| e.base_price)
            .or_else(|| ingredients.get(item).and_then(|i| i.base_price))
            .unwrap_or(FALLBACK_PRICE_GP)
    }

    /// Buy one unit at the listed price. Payment comes from gold pieces only.
    pub fn buy(
        &mut self,
        player: &str,
        item: &str,
        gold: &mut GoldBook,
        inventory: &mut Inventories,
    ) -> GameResult<(String, u32)> {
        let name = self
            .find_name(item)
            .filter(|n| self.stock(n) > 0)
            .ok_or_else(|| GameError::OutOfStock("that item is not currently for sale".into()))?;
        let price = self.items[&name].base_price;

        let mut purse = gold.ensure(player);
        if purse.gp < price as u64 {
            return Err(GameError::InsufficientFunds {
                needed_cp: Coins::gold(price as u64).total_cp(),
                available_cp: Coins::gold(purse.gp).total_cp(),
            });
        }
        purse.gp -= price as u64;
        gold.set(player, purse);
        inventory.add(player, &name, 1);
        if let Some(entry) = self.items.get_mut(&name) {
            entry.stock -= 1;
        }
        info!(target: "audit", "{} bought {} from Basil for {} gp", escape_log(player), name, price);
        Ok((name, price))
    }

    /// Sell one held unit back to the market at the player's quote.
    pub fn sell(
        &mut self,
        player: &str,
        item: &str,
        stats: &PlayerStats,
        ingredients: &IngredientTable,
        gold: &mut GoldBook,
        inventory: &mut Inventories,
    ) -> GameResult<(String, u32)> {
        let name = inventory
            .find_name(player, item)
            .ok_or_else(|| GameError::InsufficientItems(format!("you don't have any {} to sell", item.trim())))?;
        let base = self.base_price(&name, ingredients);
        let price = quote(base, stats);

        inventory.remove(player, &name, 1);
        gold.credit(player, Coins::gold(price as u64));
        self.items
            .entry(name.clone())
            .or_insert(MarketEntry {
                base_price: base,
                stock: 0,
            })
            .stock += 1;
        info!(target: "audit", "{} sold {} to Basil for {} gp", escape_log(player), name, price);
        Ok((name, price))
    }

    /// Move Basil's finished brews onto the shelves and empty the crafted stock.
    pub fn shelve_crafted(&mut self, crafted: &mut CraftedStock, price_gp: u32) -> u32 {
        let mut moved = 0;
        for (item, entry) in crafted.iter() {
            if entry.quantity == 0 {
                continue;
            }
            let slot = self.items.entry(item.clone()).or_insert(MarketEntry {
                base_price: price_gp,
                stock: 0,
            });
            slot.stock = slot.stock.saturating_add(entry.quantity);
            moved += entry.quantity;
        }
        crafted.clear();
        moved
    }
}

/// Selling price for a player: `max(1, base + CHA + 2 if persuasive)`.
pub fn quote(base_price: u32, stats: &PlayerStats) -> u32 {
    let persuasion = if stats.proficient_persuasion { 2 } else { 0 };
    let price = i64::from(base_price)
        .saturating_add(stats.charisma_mod)
        .saturating_add(persuasion)
        .max(1);
    u32::try_from(price).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::dice::{ScriptedRoller, ThreadRoller};
    use crate::game::herbalism::Ingredient;

    fn ingredients() -> IngredientTable {
        let mut t = IngredientTable::new();
        for (name, rarity) in [("Bloodgrass", "Common"), ("Frost Lichen", "Very Rare"), ("Odd Moss", "Mythic")] {
            t.insert(
                name.into(),
                Ingredient {
                    rarity: rarity.into(),
                    effect: String::new(),
                    dc: 1,
                    base_price: None,
                },
            );
        }
        t
    }

    #[test]
    fn generated_prices_follow_rarity_ranges() {
        let table = ingredients();
        let mut roller = ThreadRoller;
        for _ in 0..50 {
            let m = Market::generate(&table, 1.0, &mut roller);
            let common = m.items["Bloodgrass"];
            let very_rare = m.items["Frost Lichen"];
            let unknown = m.items["Odd Moss"];
            assert!((5..=15).contains(&common.base_price));
            assert!((50..=100).contains(&very_rare.base_price));
            assert!((5..=15).contains(&unknown.base_price));
            assert!((1..=5).contains(&common.stock));
        }
    }

    #[test]
    fn staleness_uses_refresh_period() {
        let m = Market { last_update: 0.0, items: BTreeMap::new() };
        assert!(!m.is_stale(6.0 * SECONDS_PER_DAY, 7));
        assert!(m.is_stale(7.5 * SECONDS_PER_DAY, 7));
    }

    #[test]
    fn market_json_keeps_last_update_beside_items() {
        let json = r#"{"last_update": 12.5, "Bloodgrass": {"base_price": 7, "stock": 2}}"#;
        let m: Market = serde_json::from_str(json).unwrap();
        assert_eq!(m.last_update, 12.5);
        assert_eq!(m.items["Bloodgrass"], MarketEntry { base_price: 7, stock: 2 });
        let back = serde_json::to_value(&m).unwrap();
        assert_eq!(back["Bloodgrass"]["stock"], 2);
    }

    #[test]
    fn quote_never_drops_below_one() {
        let rude = PlayerStats { charisma_mod: -20, ..Default::default() };
        assert_eq!(quote(5, &rude), 1);
        let smooth = PlayerStats { charisma_mod: 3, proficient_persuasion: true, ..Default::default() };
        assert_eq!(quote(10, &smooth), 15);
    }

    #[test]
    fn quote_clamps_extreme_charisma() {
        let silver_tongue = PlayerStats { charisma_mod: i64::MAX, proficient_persuasion: true, ..Default::default() };
        assert_eq!(quote(10, &silver_tongue), u32::MAX);
        let boor = PlayerStats { charisma_mod: i64::MIN, ..Default::default() };
        assert_eq!(quote(10, &boor), 1);
    }

    #[test]
    fn buy_deducts_gold_and_stock() {
        let mut roller = ScriptedRoller::with_ints([8, 2]);
        let mut table = IngredientTable::new();
        table.insert("Bloodgrass".into(), ingredients()["Bloodgrass"].clone());
        let mut m = Market::generate(&table, 0.0, &mut roller);
        let mut gold = GoldBook::default();
        gold.set("p", Coins::gold(10));
        let mut inv = Inventories::default();
        assert_eq!(m.buy("p", "bloodgrass", &mut gold, &mut inv).unwrap(), ("Bloodgrass".into(), 8));
        assert_eq!(gold.balance("p"), Coins::gold(2));
        assert_eq!(m.stock("Bloodgrass"), 1);
        assert!(matches!(
            m.buy("p", "Bloodgrass", &mut gold, &mut inv),
            Err(GameError::InsufficientFunds { .. })
        ));
        assert_eq!(m.stock("Bloodgrass"), 1);
    }

    #[test]
    fn selling_unknown_item_creates_entry_at_fallback_price() {
        let mut m = Market::default();
        let mut gold = GoldBook::default();
        let mut inv = Inventories::default();
        inv.add("p", "Troll Tooth", 1);
        let (name, price) = m
            .sell("p", "troll tooth", &PlayerStats::default(), &IngredientTable::new(), &mut gold, &mut inv)
            .unwrap();
        assert_eq!(name, "Troll Tooth");
        assert_eq!(price, FALLBACK_PRICE_GP);
        assert_eq!(m.items["Troll Tooth"], MarketEntry { base_price: 10, stock: 1 });
        assert_eq!(gold.balance("p"), Coins::gold(10));
        assert!(inv.bag("p").is_none());
    }

    #[test]
    fn shelving_moves_crafted_stock() {
        let mut m = Market::default();
        let mut crafted = CraftedStock::default();
        crafted.add("Healing Potion", 3, None);
        assert_eq!(m.shelve_crafted(&mut crafted, 50), 3);
        assert!(crafted.is_empty());
        assert_eq!(m.items["Healing Potion"], MarketEntry { base_price: 50, stock: 3 });
    }
}
