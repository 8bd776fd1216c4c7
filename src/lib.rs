//! # Tavernkeep - Tabletop RPG Shopkeeper Bots
//!
//! Two chat-bot personas for a tabletop RPG community that share one set of
//! JSON documents for inventories, gold and stats.
//!
//! ## Features
//!
//! - **Basil**: herb gathering by terrain, herb identification, recipe crafting
//!   with a two-step confirmation, an ingredient market with weekly prices, and
//!   Basil's own crafting runs between sessions.
//! - **Stanley**: gold balances in gp/sp/cp, a categorized gear shop, item
//!   requests that admins approve into the shop, and a capped audit log.
//! - **Shared d20 rule**: natural 1 always fails critically, natural 20 always
//!   succeeds critically, otherwise the total must meet the DC.
//! - **Safe persistence**: locked, atomic JSON writes so both personas can run
//!   against the same shared folder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tavernkeep::bot::{Bot, Caller, Persona};
//! use tavernkeep::config::Config;
//! use tavernkeep::game::ThreadRoller;
//! use tavernkeep::storage::JsonStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = JsonStore::open(&config.storage)?;
//!     let mut basil = Bot::new(Persona::Basil, config, store, Box::new(ThreadRoller));
//!     let caller = Caller::new("42", "Ada");
//!     for reply in basil.handle(&caller, "/gather terrain:forest").await {
//!         println!("{}", reply.render());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - Personas, command tables, argument parsing and reply formatting
//! - [`game`] - Pure rules for every document: checks, crafting, market, shop
//! - [`storage`] - Named JSON documents with defaults and locked writes
//! - [`config`] - TOML configuration
//! - [`logutil`] - Log sanitizing helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Console / Chat │ ← "/command key:value" lines
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   bot::Bot      │ ← Basil or Stanley handlers
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   game rules    │ ← no I/O
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   JsonStore     │ ← data/{shared,basil,stanley}
//! └─────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod game;
pub mod logutil;
pub mod storage;
