//! Stanley's gear shop (`stanley_shop.json`).
//!
//! This module provides:
//! - Categorized stock with prices in copper
//! - Buy at list price, sell back at half
//! - Admin restocking to a minimum level
//!
//! Item names are matched case-insensitively across every category.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::currency::Coins;
use super::errors::{GameError, GameResult};
use super::gold::GoldBook;
use super::inventory::Inventories;
use crate::logutil::escape_log;

/// An item for sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub price_cp: u64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

impl ShopItem {
    pub fn new(price_cp: u64, stock: u32) -> Self {
        Self {
            price_cp,
            stock,
            rarity: None,
        }
    }

    /// Check if item is in stock
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Reduce stock by amount (returns actual amount reduced)
    pub fn reduce_stock(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.stock);
        self.stock -= actual;
        actual
    }

    pub fn increase_stock(&mut self, amount: u32) {
        self.stock = self.stock.saturating_add(amount);
    }

    /// Half price, rounded down.
    pub fn sell_price_cp(&self) -> u64 {
        self.price_cp / 2
    }
}

/// Title-case a category key: `adventuring_gear` → `Adventuring Gear`.
pub fn display_category(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Completed shop transaction, for replies and the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub item: String,
    pub price_cp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shop(BTreeMap<String, BTreeMap<String, ShopItem>>);

impl Shop {
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|c| c.is_empty())
    }

    pub fn categories(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Items of one category; the key may be given in display form.
    pub fn category(&self, key: &str) -> Option<(&str, &BTreeMap<String, ShopItem>)> {
        let wanted = key.trim().to_lowercase().replace(' ', "_");
        self.0
            .iter()
            .find(|(k, _)| k.to_lowercase().replace(' ', "_") == wanted)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Case-insensitive lookup across categories, returning the stored name.
    pub fn find(&self, item: &str) -> Option<(&str, &ShopItem)> {
        let wanted = item.trim().to_lowercase();
        self.0
            .values()
            .flat_map(|items| items.iter())
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(name, data)| (name.as_str(), data))
    }

    fn find_mut(&mut self, item: &str) -> Option<(String, &mut ShopItem)> {
        let wanted = item.trim().to_lowercase();
        self.0
            .values_mut()
            .flat_map(|items| items.iter_mut())
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(name, data)| (name.clone(), data))
    }

    pub fn insert(&mut self, category: &str, item: &str, data: ShopItem) {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(item.to_string(), data);
    }

    /// Buy one unit. Refuses unknown items, empty stock and short purses.
    pub fn buy(
        &mut self,
        player: &str,
        item: &str,
        gold: &mut GoldBook,
        inventory: &mut Inventories,
    ) -> GameResult<Trade> {
        let (name, data) = self
            .find_mut(item)
            .ok_or_else(|| GameError::NotFound(item.trim().to_string()))?;
        if !data.in_stock() {
            return Err(GameError::OutOfStock(name));
        }
        gold.ensure(player);
        gold.debit(player, Coins::from_cp(data.price_cp))?;
        data.reduce_stock(1);
        inventory.add(player, &name, 1);
        info!(target: "audit", "{} bought {} for {}", escape_log(player), name, Coins::from_cp(data.price_cp));
        Ok(Trade {
            price_cp: data.price_cp,
            item: name,
        })
    }

    /// Sell one held unit back for half its list price.
    pub fn sell(
        &mut self,
        player: &str,
        item: &str,
        gold: &mut GoldBook,
        inventory: &mut Inventories,
    ) -> GameResult<Trade> {
        let held = inventory
            .find_name(player, item)
            .ok_or_else(|| GameError::InsufficientItems(item.trim().to_string()))?;
        let (_, data) = self
            .find_mut(&held)
            .ok_or_else(|| GameError::NotFound(held.clone()))?;
        let price_cp = data.sell_price_cp();
        data.increase_stock(1);
        inventory.remove(player, &held, 1);
        gold.credit(player, Coins::from_cp(price_cp));
        info!(target: "audit", "{} sold {} for {}", escape_log(player), held, Coins::from_cp(price_cp));
        Ok(Trade { item: held, price_cp })
    }

    /// Raise every item to at least `minimum` stock. Returns how many items changed.
    pub fn restock(&mut self, minimum: u32) -> usize {
        let mut changed = 0;
        for data in self.0.values_mut().flat_map(|c| c.values_mut()) {
            if data.stock < minimum {
                data.stock = minimum;
                changed += 1;
            }
        }
        info!("Restocked {} shop items to at least {}", changed, minimum);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> Shop {
        let mut s = Shop::default();
        s.insert("adventuring_gear", "Rope (50 feet)", ShopItem::new(100, 2));
        s.insert("adventuring_gear", "Torch", ShopItem::new(1, 0));
        s.insert("weapons", "Dagger", ShopItem::new(200, 1));
        s
    }

    #[test]
    fn test_display_category() {
        assert_eq!(display_category("adventuring_gear"), "Adventuring Gear");
        assert_eq!(display_category("weapons"), "Weapons");
    }

    #[test]
    fn test_buy_success() {
        let mut s = shop();
        let mut gold = GoldBook::default();
        gold.set("p", Coins::new(1, 5, 0));
        let mut inv = Inventories::default();
        let trade = s.buy("p", "rope (50 FEET)", &mut gold, &mut inv).unwrap();
        assert_eq!(trade.item, "Rope (50 feet)");
        assert_eq!(gold.balance("p"), Coins::new(0, 5, 0));
        assert_eq!(s.find("Rope (50 feet)").unwrap().1.stock, 1);
        assert_eq!(inv.quantity("p", "Rope (50 feet)"), 1);
    }

    #[test]
    fn test_buy_refusals_change_nothing() {
        let mut s = shop();
        let mut gold = GoldBook::default();
        gold.set("p", Coins::new(1, 0, 0));
        let mut inv = Inventories::default();
        assert!(matches!(s.buy("p", "Torch", &mut gold, &mut inv), Err(GameError::OutOfStock(_))));
        assert!(matches!(s.buy("p", "Lute", &mut gold, &mut inv), Err(GameError::NotFound(_))));
        assert!(matches!(
            s.buy("p", "Dagger", &mut gold, &mut inv),
            Err(GameError::InsufficientFunds { .. })
        ));
        assert_eq!(gold.balance("p"), Coins::new(1, 0, 0));
        assert_eq!(s.find("Dagger").unwrap().1.stock, 1);
        assert!(inv.bag("p").is_none());
    }

    #[test]
    fn test_sell_half_price() {
        let mut s = shop();
        let mut gold = GoldBook::default();
        let mut inv = Inventories::default();
        inv.add("p", "dagger", 1);
        let trade = s.sell("p", "Dagger", &mut gold, &mut inv).unwrap();
        assert_eq!(trade.price_cp, 100);
        assert_eq!(gold.balance("p"), Coins::gold(1));
        assert_eq!(s.find("dagger").unwrap().1.stock, 2);
        assert!(inv.bag("p").is_none());
    }

    #[test]
    fn test_sell_non_shop_item_refused() {
        let mut s = shop();
        let mut gold = GoldBook::default();
        let mut inv = Inventories::default();
        inv.add("p", "Bloodgrass", 1);
        assert!(matches!(s.sell("p", "Bloodgrass", &mut gold, &mut inv), Err(GameError::NotFound(_))));
        assert!(matches!(s.sell("p", "Dagger", &mut gold, &mut inv), Err(GameError::InsufficientItems(_))));
        assert_eq!(inv.quantity("p", "Bloodgrass"), 1);
    }

    #[test]
    fn test_restock() {
        let mut s = shop();
        assert_eq!(s.restock(3), 3);
        assert_eq!(s.find("Torch").unwrap().1.stock, 3);
        assert_eq!(s.restock(3), 0);
    }
}
