//! Persona flavour lines (`responses.json`, `stanley_responses.json`).
//!
//! Each category holds several templates; one is picked at random and its
//! `{placeholder}` fields are filled in.

use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dice::Roller;

pub const UNKNOWN_CATEGORY_LINE: &str = "🤔 Stanley scratches his head. _'I wasn't prepared for that one!'_";
pub const MISSING_FILE_LINE: &str = "⚠️ Error: the response file is missing or empty!";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseBook(BTreeMap<String, Vec<String>>);

impl ResponseBook {
    pub fn insert(&mut self, category: &str, templates: Vec<String>) {
        self.0.insert(category.to_string(), templates);
    }

    /// A random line from `category` with `vars` substituted.
    pub fn pick(&self, category: &str, vars: &[(&str, &str)], roller: &mut dyn Roller) -> String {
        if self.0.is_empty() {
            error!("response file failed to load or is empty");
            return MISSING_FILE_LINE.to_string();
        }
        let templates = match self.0.get(category) {
            Some(t) if !t.is_empty() => t,
            _ => {
                warn!("response category `{}` not found", category);
                return UNKNOWN_CATEGORY_LINE.to_string();
            }
        };
        fill(&templates[roller.pick(templates.len())], vars)
    }

    /// Like [`ResponseBook::pick`], but a missing category quietly yields `fallback`.
    pub fn pick_or(&self, category: &str, vars: &[(&str, &str)], roller: &mut dyn Roller, fallback: &str) -> String {
        match self.0.get(category) {
            Some(t) if !t.is_empty() => fill(&t[roller.pick(t.len())], vars),
            _ => fill(fallback, vars),
        }
    }
}

/// Replace every `{key}` in `template`. Unknown placeholders are left as-is.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::dice::ScriptedRoller;

    #[test]
    fn picks_and_fills_template() {
        let mut book = ResponseBook::default();
        book.insert(
            "buy_success",
            vec!["{user} walks off with {item}.".into(), "Sold! {item} is yours, {user}.".into()],
        );
        let mut roller = ScriptedRoller::with_ints([1]);
        let line = book.pick("buy_success", &[("user", "Ada"), ("item", "rope")], &mut roller);
        assert_eq!(line, "Sold! rope is yours, Ada.");
    }

    #[test]
    fn missing_category_and_file_fall_back() {
        let mut roller = ScriptedRoller::new();
        assert_eq!(ResponseBook::default().pick("x", &[], &mut roller), MISSING_FILE_LINE);
        let mut book = ResponseBook::default();
        book.insert("other", vec!["hi".into()]);
        assert_eq!(book.pick("x", &[], &mut roller), UNKNOWN_CATEGORY_LINE);
    }

    #[test]
    fn pick_or_uses_fallback_without_rolling() {
        let mut roller = ScriptedRoller::with_ints([0]);
        let book = ResponseBook::default();
        assert_eq!(book.pick_or("gather_nothing", &[("user", "Ada")], &mut roller, "{user} found nothing."), "Ada found nothing.");
        assert_eq!(roller.remaining(), 1);
    }
}
