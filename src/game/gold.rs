//! Gold balances (`gold_data.json`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::currency::Coins;
use super::errors::GameResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoldBook(BTreeMap<String, Coins>);

impl GoldBook {
    /// Initialize a zero balance when the player has none. Returns the balance.
    pub fn ensure(&mut self, player: &str) -> Coins {
        *self.0.entry(player.to_string()).or_default()
    }

    pub fn balance(&self, player: &str) -> Coins {
        self.0.get(player).copied().unwrap_or_default()
    }

    pub fn set(&mut self, player: &str, coins: Coins) {
        self.0.insert(player.to_string(), coins.normalized());
    }

    /// Add coins to a player. Used for sales and admin grants.
    pub fn credit(&mut self, player: &str, coins: Coins) -> Coins {
        let updated = self.balance(player).checked_add(coins);
        self.set(player, updated);
        updated
    }

    /// Remove coins, refusing when the player is short.
    pub fn debit(&mut self, player: &str, coins: Coins) -> GameResult<Coins> {
        let updated = self.balance(player).checked_sub(coins)?;
        self.set(player, updated);
        Ok(updated)
    }

    /// Move coins between players. Nothing changes when the giver is short.
    pub fn give(&mut self, from: &str, to: &str, coins: Coins) -> GameResult<()> {
        self.debit(from, coins)?;
        self.credit(to, coins);
        Ok(())
    }

    /// Admin removal.
    pub fn take(&mut self, player: &str, coins: Coins) -> GameResult<Coins> {
        self.ensure(player);
        self.debit(player, coins)
    }

    /// Admin reward minted from nowhere.
    pub fn grant(&mut self, player: &str, coins: Coins) -> Coins {
        self.credit(player, coins)
    }
}
