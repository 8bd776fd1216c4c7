//! # Bot Module - Persona Command Handling
//!
//! A [`Bot`] is one persona (Basil or Stanley) bound to a [`JsonStore`], a
//! [`Roller`] and the loaded [`Config`]. Each incoming line is parsed
//! against the persona's command table, permission-checked, and dispatched
//! to a handler that loads documents through one store batch, applies the
//! game rules and returns the replies.
//!
//! Game refusals (unknown item, not enough gold, no attempts left) become
//! user-facing lines. Anything else is logged and answered with a generic
//! apology so the front end keeps running.

pub mod basil;
pub mod command;
pub mod console;
pub mod reply;
pub mod stanley;

use log::{error, info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub use command::{Caller, CommandSpec};
pub use reply::{Embed, Reply};

use crate::config::Config;
use crate::game::errors::GameError;
use crate::game::Roller;
use crate::logutil::{caller_label, escape_log};
use crate::storage::JsonStore;
use command::ParseError;

pub const GENERIC_FAILURE_LINE: &str = "⚠️ Something went wrong while handling that command. Please try again.";
pub const ADMIN_ONLY_LINE: &str = "❌ You need administrator permissions to use this command.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Persona {
    Basil,
    Stanley,
}

impl Persona {
    pub fn commands(self) -> &'static [CommandSpec] {
        match self {
            Persona::Basil => basil::COMMANDS,
            Persona::Stanley => stanley::COMMANDS,
        }
    }

    /// Status lines shown while the bot is online.
    pub fn presence_lines(self) -> &'static [&'static str] {
        match self {
            Persona::Basil => &[
                "Brewing Potions...",
                "Exploring the Herbal Archives...",
                "Experimenting with Alchemy...",
                "Collecting Rare Ingredients...",
            ],
            Persona::Stanley => &[
                "Counting gold and overcharging adventurers...",
                "Stocking shelves with rare and 'totally legit' artifacts...",
                "Polishing my wares... and my sales pitch.",
                "Negotiating with goblins over potion prices...",
                "Inspecting a 'gently used' magic sword...",
                "Debating if I should restock or just scam customers...",
                "Filling out paperwork for a very 'legal' business deal...",
                "Wondering if anyone will notice a cursed item in the shop...",
            ],
        }
    }

    pub fn display_name(self, config: &Config) -> &str {
        match self {
            Persona::Basil => &config.bot.basil_name,
            Persona::Stanley => &config.bot.stanley_name,
        }
    }
}

/// A crafting attempt waiting for `/confirm`.
#[derive(Debug, Clone)]
pub struct PendingCraft {
    pub recipe: String,
    pub created_at: Instant,
}

pub struct Bot {
    persona: Persona,
    config: Config,
    store: JsonStore,
    roller: Box<dyn Roller>,
    pending: HashMap<String, PendingCraft>,
}

impl Bot {
    pub fn new(persona: Persona, config: Config, store: JsonStore, roller: Box<dyn Roller>) -> Self {
        Self {
            persona,
            config,
            store,
            roller,
            pending: HashMap::new(),
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// A random presence line for this persona.
    pub fn presence(&mut self) -> &'static str {
        let lines = self.persona.presence_lines();
        lines[self.roller.pick(lines.len())]
    }

    fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.config.game.confirm_timeout_secs)
    }

    /// Handle one chat line from `caller`. Lines that are not commands yield no replies.
    pub async fn handle(&mut self, caller: &Caller, line: &str) -> Vec<Reply> {
        let (spec, args) = match command::parse(line, self.persona.commands()) {
            Ok(parsed) => parsed,
            Err(ParseError::NotACommand) => return Vec::new(),
            Err(e) => {
                warn!("Rejected command from {}: {} ({})", caller_label(&caller.user_id, &caller.display_name), e, escape_log(line));
                return vec![Reply::private(format!("❌ {}", capitalize(&e.to_string())))];
            }
        };

        if spec.admin_only && !caller.is_admin {
            warn!(
                target: "security",
                "{} tried admin command /{} without permission",
                caller_label(&caller.user_id, &caller.display_name),
                spec.name
            );
            return vec![Reply::private(ADMIN_ONLY_LINE)];
        }

        info!(
            "{} ran /{} on {:?}",
            caller_label(&caller.user_id, &caller.display_name),
            spec.name,
            self.persona
        );
        let result = match self.persona {
            Persona::Basil => basil::dispatch(self, caller, spec.name, &args).await,
            Persona::Stanley => stanley::dispatch(self, caller, spec.name, &args).await,
        };
        match result {
            Ok(replies) => replies,
            Err(e) => render_error(spec.name, &e),
        }
    }
}

/// User-facing line for a game refusal.
pub fn refusal_line(e: &GameError) -> String {
    match e {
        GameError::InsufficientFunds { .. } => "❌ You don't have enough gold!".to_string(),
        GameError::NotFound(m)
        | GameError::InsufficientItems(m)
        | GameError::OutOfStock(m)
        | GameError::PermissionDenied(m)
        | GameError::InvalidArgument(m)
        | GameError::NotReady(m) => format!("❌ {}.", capitalize(m.trim_end_matches('.'))),
        other => format!("❌ {}", other),
    }
}

fn render_error(command: &str, e: &anyhow::Error) -> Vec<Reply> {
    if let Some(game) = e.downcast_ref::<GameError>() {
        if game.is_refusal() {
            return vec![Reply::text(refusal_line(game))];
        }
    }
    error!("/{} failed: {:#}", command, e);
    vec![Reply::text(GENERIC_FAILURE_LINE)]
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Current wall-clock time as fractional unix seconds.
pub(crate) fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusals_read_as_sentences() {
        assert_eq!(
            refusal_line(&GameError::NotFound("that recipe does not exist".into())),
            "❌ That recipe does not exist."
        );
        assert_eq!(
            refusal_line(&GameError::InsufficientFunds { needed_cp: 500, available_cp: 10 }),
            "❌ You don't have enough gold!"
        );
    }

    #[test]
    fn environment_errors_become_generic_apology() {
        let err = anyhow::Error::new(GameError::Locked("busy".into()));
        assert_eq!(render_error("buy", &err)[0].content, GENERIC_FAILURE_LINE);
        let refusal = anyhow::Error::new(GameError::OutOfStock("that item is not currently for sale".into()));
        assert_eq!(render_error("buy", &refusal)[0].content, "❌ That item is not currently for sale.");
    }

    #[test]
    fn every_persona_has_presence_lines_and_help() {
        for persona in [Persona::Basil, Persona::Stanley] {
            assert!(!persona.presence_lines().is_empty());
            assert!(persona.commands().iter().any(|c| c.name.ends_with("_help")));
        }
    }
}
