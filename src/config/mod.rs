//! # Configuration Management Module
//!
//! TOML configuration for both personas. A single file drives the console
//! front end, the data layout and the tunable game constants.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - Persona names, admin ids, chat message limits
//! - [`StorageConfig`] - Data, shared and defaults folders
//! - [`LoggingConfig`] - Log level and optional log file
//! - [`GameConfig`] - Attempts, bonuses, refresh periods and caps
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tavernkeep::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Data dir: {}", config.storage.data_dir);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! basil_name = "Basil"
//! stanley_name = "Stanley"
//! admin_ids = ["1001"]
//!
//! [storage]
//! data_dir = "./data"
//! defaults_dir = "./data/defaults"
//!
//! [game]
//! gather_attempts_per_day = 3
//! market_refresh_days = 7
//! ```
//!
//! Every `[game]` key may be omitted; missing keys take the defaults shown
//! in [`GameConfig::default`].

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub basil_name: String,
    pub stanley_name: String,
    /// User ids allowed to run admin-only commands.
    #[serde(default)]
    pub admin_ids: Vec<String>,
    /// Longest single chat message.
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,
    /// Longest embed field value.
    #[serde(default = "default_field_limit")]
    pub embed_field_limit: usize,
}

fn default_message_limit() -> usize {
    2000
}

fn default_field_limit() -> usize {
    1024
}

impl BotConfig {
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Folder for shared documents when it lives outside `data_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_dir: Option<String>,
    pub defaults_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub gather_attempts_per_day: u32,
    /// Flat bonus for herbalism kit or alchemist's tools.
    pub tool_bonus: i64,
    /// Basil's own brewing bonus.
    pub basil_craft_bonus: i64,
    pub market_refresh_days: u32,
    pub audit_cap: usize,
    /// Minimum stock after an admin shop refresh.
    pub default_restock: u32,
    pub confirm_timeout_secs: u64,
    /// Shelf price for Basil's brews moved to the market by `/open_shop`.
    pub crafted_potion_price_gp: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gather_attempts_per_day: 3,
            tool_bonus: 2,
            basil_craft_bonus: 8,
            market_refresh_days: 7,
            audit_cap: 50,
            default_restock: 3,
            confirm_timeout_secs: 30,
            crafted_potion_price_gp: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject values that would make the game rules misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.bot.message_limit < 100 {
            return Err(anyhow!("bot.message_limit must be at least 100"));
        }
        if self.bot.embed_field_limit == 0 || self.bot.embed_field_limit > self.bot.message_limit {
            return Err(anyhow!("bot.embed_field_limit must be between 1 and bot.message_limit"));
        }
        if self.game.market_refresh_days == 0 {
            return Err(anyhow!("game.market_refresh_days must be at least 1"));
        }
        if self.game.audit_cap == 0 {
            return Err(anyhow!("game.audit_cap must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                basil_name: "Basil".to_string(),
                stanley_name: "Stanley".to_string(),
                admin_ids: Vec::new(),
                message_limit: default_message_limit(),
                embed_field_limit: default_field_limit(),
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                shared_dir: None,
                defaults_dir: "./data/defaults".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("tavernkeep.log".to_string()),
            },
            game: GameConfig::default(),
        }
    }
}
