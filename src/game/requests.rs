//! Item requests for Stanley (`requestable_items.json`, `requests.json`).
//!
//! Players may only ask for catalogued items, once each. An admin approval
//! moves the item into the shop and clears its pending requests.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::{GameError, GameResult};
use super::shop::{Shop, ShopItem};
use crate::logutil::escape_log;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestableItem {
    pub price_gp: u64,
    #[serde(default)]
    pub rarity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(BTreeMap<String, BTreeMap<String, RequestableItem>>);

impl Catalog {
    /// Category and data of a catalogued item (names are stored lowercase).
    pub fn find(&self, item: &str) -> Option<(&str, &RequestableItem)> {
        let wanted = normalize(item);
        self.0.iter().find_map(|(cat, items)| {
            items
                .iter()
                .find(|(name, _)| name.to_lowercase() == wanted)
                .map(|(_, data)| (cat.as_str(), data))
        })
    }

    /// Category to item names, skipping empty categories.
    pub fn available(&self) -> Vec<(&str, Vec<&str>)> {
        self.0
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(cat, items)| (cat.as_str(), items.keys().map(String::as_str).collect()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|c| c.is_empty())
    }

    /// Admin: list a new requestable item.
    pub fn add(&mut self, item: &str, price_gp: u64, rarity: &str, category: &str) -> GameResult<String> {
        let item = normalize(item);
        let category = normalize(category);
        if item.is_empty() || category.is_empty() {
            return Err(GameError::InvalidArgument("item and category are required".into()));
        }
        if let Some((existing, _)) = self.find(&item) {
            return Err(GameError::InvalidArgument(format!(
                "{} is already in the requestable items list under {}",
                item, existing
            )));
        }
        self.0.entry(category.clone()).or_default().insert(
            item.clone(),
            RequestableItem {
                price_gp,
                rarity: rarity.trim().to_string(),
            },
        );
        info!("Added requestable item {} under {}", escape_log(&item), escape_log(&category));
        Ok(category)
    }
}

/// `requests.json`: item name to requesting player ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requests(BTreeMap<String, Vec<String>>);

impl Requests {
    /// Record a request. Items outside the catalog and duplicates are refused.
    pub fn request(&mut self, catalog: &Catalog, player: &str, item: &str) -> GameResult<String> {
        let item = normalize(item);
        if catalog.find(&item).is_none() {
            return Err(GameError::NotFound(item));
        }
        let players = self.0.entry(item.clone()).or_default();
        if players.iter().any(|p| p == player) {
            return Err(GameError::InvalidArgument(format!("already requested {}", item)));
        }
        players.push(player.to_string());
        info!("{} requested {}", escape_log(player), escape_log(&item));
        Ok(item)
    }

    /// Items with at least one waiting player.
    pub fn pending(&self) -> Vec<(&str, &[String])> {
        self.0
            .iter()
            .filter(|(_, players)| !players.is_empty())
            .map(|(item, players)| (item.as_str(), players.as_slice()))
            .collect()
    }

    /// Admin: stock a requested item in the shop and clear its requests.
    pub fn approve(&mut self, catalog: &Catalog, shop: &mut Shop, item: &str, stock: u32) -> GameResult<ShopItem> {
        let item = normalize(item);
        if self.0.get(&item).map_or(true, |p| p.is_empty()) {
            return Err(GameError::NotFound(format!("{} is not in the request list", item)));
        }
        if stock == 0 {
            return Err(GameError::InvalidArgument(format!(
                "cannot approve {} with zero stock",
                item
            )));
        }
        let (category, data) = catalog
            .find(&item)
            .ok_or_else(|| GameError::NotFound(format!("{} is not a valid requestable item", item)))?;
        let entry = ShopItem {
            price_cp: data.price_gp.saturating_mul(100),
            stock,
            rarity: Some(data.rarity.clone()),
        };
        shop.insert(category, &item, entry.clone());
        self.0.remove(&item);
        info!(target: "audit", "Approved request for {} with stock {}", escape_log(&item), stock);
        Ok(entry)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
