//! Binary entrypoint for the tavernkeep CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and materialize every data document
//! - `console --persona <basil|stanley>` - run a persona against stdin/stdout
//! - `status` - print the data layout and a brief summary of the game state
//!
//! See the library crate docs for module-level details: `tavernkeep::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use tavernkeep::bot::console;
use tavernkeep::bot::{Bot, Caller, Persona};
use tavernkeep::config::Config;
use tavernkeep::game::audit::AuditLog;
use tavernkeep::game::clock::InGameTime;
use tavernkeep::game::inventory::Inventories;
use tavernkeep::game::market::Market;
use tavernkeep::game::requests::Requests;
use tavernkeep::game::ThreadRoller;
use tavernkeep::storage::{Document, JsonStore};

#[derive(Parser)]
#[command(name = "tavernkeep")]
#[command(about = "Basil the herbalist and Stanley the merchant, run from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and seed the data folders
    Init,
    /// Run one persona against stdin/stdout
    Console {
        /// Which bot to run
        #[arg(short, long, value_enum)]
        persona: Persona,

        /// User id to act as
        #[arg(short, long, default_value = "1")]
        user: String,

        /// Display name for the acting user
        #[arg(short, long)]
        name: Option<String>,

        /// Grant admin rights (also granted when the id is in `bot.admin_ids`)
        #[arg(long)]
        admin: bool,
    },
    /// Show data folders and a summary of the game state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init has no config yet; everything else loads it before logging starts.
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Initializing new tavernkeep configuration");
            let cfg = if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                warn!("{} already exists; leaving it untouched", cli.config);
                Config::load(&cli.config).await?
            } else {
                Config::create_default(&cli.config).await?;
                info!("Configuration file created at {}", cli.config);
                Config::default()
            };
            let store = JsonStore::open(&cfg.storage)?;
            store.ensure_all().await?;
            info!("Initialized data documents under {}", cfg.storage.data_dir);
        }
        Commands::Console {
            persona,
            user,
            name,
            admin,
        } => {
            init_logging(&pre_config, cli.verbose);
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let store = JsonStore::open(&config.storage)?;
            store.ensure_all().await?;
            let is_admin = admin || config.bot.is_admin(&user);
            let caller = Caller::new(user.clone(), name.unwrap_or(user)).admin(is_admin);
            info!("Starting {} v{}", persona.display_name(&config), env!("CARGO_PKG_VERSION"));

            let mut bot = Bot::new(persona, config, store, Box::new(ThreadRoller));
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run(&mut bot, caller, stdin, tokio::io::stdout()).await?;
        }
        Commands::Status => {
            init_logging(&pre_config, cli.verbose);
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            show_status(&config).await?;
        }
    }

    Ok(())
}

async fn show_status(config: &Config) -> Result<()> {
    let store = JsonStore::open(&config.storage)?;
    let clock: InGameTime = store.load(Document::InGameTime).await?;
    let inventories: Inventories = store.load(Document::PlayerInventories).await?;
    let market: Market = store.load(Document::Market).await?;
    let requests: Requests = store.load(Document::Requests).await?;
    let audit: AuditLog = store.load(Document::AuditLog).await?;

    println!("tavernkeep v{}", env!("CARGO_PKG_VERSION"));
    println!("Data dir:        {}", store.data_dir().display());
    println!("Shared folder:   {}", store.path(Document::PlayerInventories).parent().map(|p| p.display().to_string()).unwrap_or_default());
    println!("In-game time:    {} days, {} hours", clock.days, clock.hours);
    println!("Players:         {}", inventories.players().len());
    println!("Market items:    {}", market.items.len());
    println!("Pending requests: {}", requests.pending().len());
    println!("Audit entries:   {}", audit.len());
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| std::fs::OpenOptions::new().create(true).append(true).open(file).ok());

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Piped sessions keep the log in the file only.
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = if record.target() == "audit" || record.target() == "security" {
                    format!("{} [{}] [{}] {}", ts, record.level(), record.target(), record.args())
                } else {
                    format!("{} [{}] {}", ts, record.level(), record.args())
                };

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    }
    let _ = builder.try_init();
}
