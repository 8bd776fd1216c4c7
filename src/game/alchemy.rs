//! # Alchemy - Recipes and Crafting
//!
//! Player crafting and Basil's own brewing runs share the d20 rule from
//! [`crate::game::check`]. Inputs are consumed on every resolved attempt; a
//! missing ingredient is refused before anything is rolled or consumed.
//!
//! ```text
//!   CriticalFailure → inputs lost, a bad brew is reported
//!   Failure         → inputs lost
//!   Success         → inputs used, +1 of the recipe
//!   CriticalSuccess → inputs used, +2 of "Enhanced <recipe>" (or of the recipe)
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::check::{Check, CheckModifiers, CheckOutcome};
use super::dice::Roller;
use super::errors::{GameError, GameResult};
use super::inventory::Inventories;
use super::market::Market;
use super::stats::PlayerStats;
use crate::logutil::escape_log;

/// What a critical failure can produce.
pub const BAD_BREWS: [&str; 3] = ["Toxic Sludge", "Explosive Mixture", "Weak Poison"];

/// Placeholder in enhancement text replaced by the crafter's bonus.
pub const MODIFIER_PLACEHOLDER: &str = "Alchemy Modifier";

/// Chance that Basil improvises a recipe he lacks ingredients for.
pub const IMPROVISE_CHANCE: f64 = 0.4;

/// Longest stretch of in-game days one crafting session covers.
pub const MAX_SESSION_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub base: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(rename = "DC", alias = "dc")]
    pub dc: i64,
    #[serde(default)]
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnhancedRecipe {
    #[serde(default)]
    pub enhancements: Vec<String>,
}

pub type RecipeBook = BTreeMap<String, Recipe>;
pub type EnhancedBook = BTreeMap<String, EnhancedRecipe>;

pub fn enhanced_name(recipe: &str) -> String {
    format!("Enhanced {}", recipe)
}

/// Case-insensitive recipe lookup returning the canonical name.
pub fn find_recipe<'a>(book: &'a RecipeBook, name: &str) -> Option<(&'a str, &'a Recipe)> {
    let wanted = name.trim().to_lowercase();
    book.iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .map(|(k, v)| (k.as_str(), v))
}

/// Recipes the player holds every ingredient for.
pub fn craftable(book: &RecipeBook, inventory: &Inventories, player: &str) -> Vec<String> {
    book.iter()
        .filter(|(_, r)| inventory.has_ingredients(player, &r.base, &r.modifiers))
        .map(|(name, _)| name.clone())
        .collect()
}

pub fn recipe_names(book: &RecipeBook) -> Vec<&str> {
    book.keys().map(String::as_str).collect()
}

/// Markdown card describing one recipe's inputs, DC and effect.
pub fn recipe_card(book: &RecipeBook, name: &str) -> Option<String> {
    let (name, recipe) = find_recipe(book, name)?;
    let modifiers = if recipe.modifiers.is_empty() {
        "None".to_string()
    } else {
        recipe.modifiers.join(", ")
    };
    Some(format!(
        "🧪 **{}**\n**Base Ingredient:** {}\n**Modifiers:** {}\n**DC:** {}\n**Effect:** {}",
        name, recipe.base, modifiers, recipe.dc, recipe.effect
    ))
}

/// Pick an enhancement line for a critical success, substituting the bonus.
fn pick_enhancement(
    enhanced: &EnhancedBook,
    recipe: &str,
    bonus: i64,
    roller: &mut dyn Roller,
) -> Option<(String, String)> {
    let name = enhanced_name(recipe);
    let entry = enhanced.get(&name)?;
    if entry.enhancements.is_empty() {
        return Some((name, String::new()));
    }
    let line = &entry.enhancements[roller.pick(entry.enhancements.len())];
    Some((name, line.replace(MODIFIER_PLACEHOLDER, &bonus.to_string())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftOutcome {
    CriticalFailure { bad_brew: String },
    Failure,
    Success { item: String, quantity: u32 },
    CriticalSuccess {
        item: String,
        quantity: u32,
        enhancement: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftReport {
    pub recipe: String,
    pub check: Check,
    pub outcome: CraftOutcome,
}

/// Resolve one player crafting attempt against the shared inventory.
#[allow(clippy::too_many_arguments)]
pub fn craft(
    player: &str,
    recipe_name: &str,
    book: &RecipeBook,
    enhanced: &EnhancedBook,
    stats: &PlayerStats,
    tool_bonus: i64,
    inventory: &mut Inventories,
    roller: &mut dyn Roller,
) -> GameResult<CraftReport> {
    let (name, recipe) = find_recipe(book, recipe_name)
        .ok_or_else(|| GameError::NotFound("that recipe does not exist".into()))?;
    if !inventory.has_ingredients(player, &recipe.base, &recipe.modifiers) {
        return Err(GameError::InsufficientItems("you lack the required ingredients".into()));
    }

    let modifiers = CheckModifiers::alchemy(stats, tool_bonus);
    let check = Check::roll(roller, modifiers, recipe.dc);
    inventory.consume_ingredients(player, &recipe.base, &recipe.modifiers);

    let outcome = match check.outcome {
        CheckOutcome::CriticalFailure => {
            let bad_brew = BAD_BREWS[roller.pick(BAD_BREWS.len())].to_string();
            warn!(
                "Critical failure: {} botched {} and created {}",
                escape_log(player),
                name,
                bad_brew
            );
            CraftOutcome::CriticalFailure { bad_brew }
        }
        CheckOutcome::Failure => {
            info!("{} failed to craft {}", escape_log(player), name);
            CraftOutcome::Failure
        }
        CheckOutcome::Success => {
            inventory.add(player, name, 1);
            info!("{} crafted {}", escape_log(player), name);
            CraftOutcome::Success {
                item: name.to_string(),
                quantity: 1,
            }
        }
        CheckOutcome::CriticalSuccess => {
            let (item, enhancement) = match pick_enhancement(enhanced, name, modifiers.total(), roller) {
                Some((item, line)) => (item, Some(line).filter(|l| !l.is_empty())),
                None => (name.to_string(), None),
            };
            inventory.add(player, &item, 2);
            info!(
                "Critical success: {} crafted 2x {} ({})",
                escape_log(player),
                item,
                enhancement.as_deref().unwrap_or("extra dose")
            );
            CraftOutcome::CriticalSuccess {
                item,
                quantity: 2,
                enhancement,
            }
        }
    };

    Ok(CraftReport {
        recipe: name.to_string(),
        check,
        outcome,
    })
}

/// One line of Basil's crafted stock.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CraftedEntry {
    #[serde(default)]
    pub quantity: u32,
    /// Effects of enhanced brews, one per crafted batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
}

/// `crafted_items.json`: Basil's finished potions awaiting `/open_shop`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CraftedStock(BTreeMap<String, CraftedEntry>);

impl CraftedStock {
    pub fn add(&mut self, item: &str, quantity: u32, effect: Option<String>) {
        let entry = self.0.entry(item.to_string()).or_default();
        entry.quantity = entry.quantity.saturating_add(quantity);
        if let Some(e) = effect {
            entry.effects.push(e);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CraftedEntry)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    pub item: String,
    pub quantity: u32,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub days: u32,
    pub attempts: u32,
    pub crafted: Vec<SessionLine>,
    pub failures: Vec<String>,
    pub skipped: u32,
}

/// Basil brews on his own for `days` in-game days, drawing ingredients from
/// his market stock and adding finished potions to `crafted`.
pub fn basil_session(
    days: u32,
    book: &RecipeBook,
    enhanced: &EnhancedBook,
    bonus: i64,
    market: &mut Market,
    crafted: &mut CraftedStock,
    roller: &mut dyn Roller,
) -> SessionReport {
    let days = days.min(MAX_SESSION_DAYS);
    let mut report = SessionReport {
        days,
        ..SessionReport::default()
    };
    if book.is_empty() {
        warn!("Basil has no recipes to brew");
        return report;
    }

    let scale = 0.8 + roller.chance() * 0.4;
    let attempts = ((days as f64 * scale).floor() as u32).max(1);
    report.attempts = attempts;
    let names: Vec<&String> = book.keys().collect();

    for _ in 0..attempts {
        let name = names[roller.pick(names.len())];
        let recipe = &book[name];

        if !market.has_ingredients(&recipe.base, &recipe.modifiers) && roller.chance() >= IMPROVISE_CHANCE {
            info!("Basil lacks ingredients for {} and skips it", name);
            report.skipped += 1;
            continue;
        }

        let check = Check::roll(roller, CheckModifiers::flat(bonus), recipe.dc);
        market.consume(&recipe.base, &recipe.modifiers);

        match check.outcome {
            CheckOutcome::CriticalFailure => {
                let bad = BAD_BREWS[roller.pick(BAD_BREWS.len())].to_string();
                warn!("Basil critically failed {} and created {}", name, bad);
                report.failures.push(bad);
            }
            CheckOutcome::Failure => {
                info!("Basil failed to craft {}", name);
            }
            CheckOutcome::Success => {
                crafted.add(name, 1, None);
                report.crafted.push(SessionLine {
                    item: name.clone(),
                    quantity: 1,
                    effect: None,
                });
            }
            CheckOutcome::CriticalSuccess => {
                let (item, effect) = match pick_enhancement(enhanced, name, bonus, roller) {
                    Some((item, line)) => (item, Some(line).filter(|l| !l.is_empty())),
                    None => (name.clone(), None),
                };
                info!("Basil critically succeeded on {}", item);
                crafted.add(&item, 2, effect.clone());
                report.crafted.push(SessionLine {
                    item,
                    quantity: 2,
                    effect,
                });
            }
        }
    }
    info!(
        "Basil's crafting session over {} days: {} attempts, {} crafted, {} failures",
        days,
        attempts,
        report.crafted.len(),
        report.failures.len()
    );
    report
}
