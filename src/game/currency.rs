/// Coin purse handling - formatting, parsing, and normalization
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{GameError, GameResult};

pub const CP_PER_GP: u64 = 100;
pub const CP_PER_SP: u64 = 10;

/// A balance in gold, silver and copper pieces. Arithmetic happens in copper;
/// results are normalized back into the largest denominations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins {
    #[serde(default)]
    pub gp: u64,
    #[serde(default)]
    pub sp: u64,
    #[serde(default)]
    pub cp: u64,
}

impl Coins {
    pub fn new(gp: u64, sp: u64, cp: u64) -> Self {
        Self { gp, sp, cp }
    }

    pub fn gold(gp: u64) -> Self {
        Self::new(gp, 0, 0)
    }

    pub fn from_cp(total: u64) -> Self {
        Self {
            gp: total / CP_PER_GP,
            sp: (total % CP_PER_GP) / CP_PER_SP,
            cp: total % CP_PER_SP,
        }
    }

    pub fn total_cp(&self) -> u64 {
        self.gp
            .saturating_mul(CP_PER_GP)
            .saturating_add(self.sp.saturating_mul(CP_PER_SP))
            .saturating_add(self.cp)
    }

    pub fn is_zero(&self) -> bool {
        self.total_cp() == 0
    }

    pub fn normalized(&self) -> Self {
        Self::from_cp(self.total_cp())
    }

    pub fn checked_add(&self, other: Coins) -> Self {
        Self::from_cp(self.total_cp().saturating_add(other.total_cp()))
    }

    /// Subtract, failing with [`GameError::InsufficientFunds`] rather than going negative.
    pub fn checked_sub(&self, other: Coins) -> GameResult<Self> {
        let have = self.total_cp();
        let need = other.total_cp();
        if have < need {
            return Err(GameError::InsufficientFunds {
                needed_cp: need,
                available_cp: have,
            });
        }
        Ok(Self::from_cp(have - need))
    }

    /// Every denomination, zeros included: `"5 gp, 0 sp, 3 cp"`.
    pub fn ledger(&self) -> String {
        format!("{} gp, {} sp, {} cp", self.gp, self.sp, self.cp)
    }
}

/// Non-zero denominations only (`"5 gp, 3 sp"`), or `"0 cp"`.
impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.normalized();
        let mut parts = Vec::new();
        for (count, symbol) in [(c.gp, "gp"), (c.sp, "sp"), (c.cp, "cp")] {
            if count > 0 {
                parts.push(format!("{} {}", count, symbol));
            }
        }
        if parts.is_empty() {
            f.write_str("0 cp")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Format a copper amount for display.
pub fn format_cp(total_cp: u64) -> String {
    Coins::from_cp(total_cp).to_string()
}

/// Parse a coin amount from user input.
/// Examples: "12" (gold), "5gp 3sp 2cp", "5 gp 3 sp", "7 copper"
pub fn parse_coins(input: &str) -> GameResult<Coins> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GameError::InvalidArgument("empty coin amount".into()));
    }

    // Bare number means gold pieces
    if let Ok(value) = input.parse::<u64>() {
        return Ok(Coins::gold(value));
    }

    let mut coins = Coins::default();
    let tokens = split_amount_tokens(input);
    let mut i = 0;
    while i < tokens.len() {
        let amount: u64 = tokens[i]
            .parse()
            .map_err(|_| GameError::InvalidArgument(format!("expected a number, got '{}'", tokens[i])))?;
        let tier = tokens
            .get(i + 1)
            .ok_or_else(|| GameError::InvalidArgument("missing denomination after amount".into()))?;
        match tier.to_lowercase().as_str() {
            "gp" | "g" | "gold" => coins.gp = coins.gp.saturating_add(amount),
            "sp" | "s" | "silver" => coins.sp = coins.sp.saturating_add(amount),
            "cp" | "c" | "copper" => coins.cp = coins.cp.saturating_add(amount),
            other => {
                return Err(GameError::InvalidArgument(format!(
                    "unknown denomination '{}'",
                    other
                )))
            }
        }
        i += 2;
    }
    Ok(coins)
}

/// Split "5gp 3 sp" into ["5", "gp", "3", "sp"].
fn split_amount_tokens(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in input.split(|c: char| c.is_whitespace() || c == ',') {
        if word.is_empty() {
            continue;
        }
        let digits: String = word.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() && digits.len() < word.len() {
            tokens.push(digits.clone());
            tokens.push(word[digits.len()..].to_string());
        } else {
            tokens.push(word.to_string());
        }
    }
    tokens
}
