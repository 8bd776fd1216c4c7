//! Test utilities & fixtures.
//! Every test gets its own temp data dir seeded from the repo's `data/defaults`.

use std::path::{Path, PathBuf};

use tavernkeep::bot::{Bot, Caller, Persona, Reply};
use tavernkeep::config::Config;
use tavernkeep::game::ScriptedRoller;
use tavernkeep::storage::{Document, JsonStore};

/// The seed documents shipped with the crate.
pub fn defaults_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("defaults")
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub config: Config,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.storage.data_dir = dir.path().join("data").to_string_lossy().into_owned();
        config.storage.defaults_dir = defaults_root().to_string_lossy().into_owned();
        config.storage.shared_dir = None;
        config.logging.file = None;
        config.bot.admin_ids = vec!["900".to_string()];
        Self { dir, config }
    }

    pub fn store(&self) -> JsonStore {
        JsonStore::open(&self.config.storage).expect("open store")
    }

    /// A bot whose integer rolls come from `ints`, in order.
    pub fn bot(&self, persona: Persona, ints: impl IntoIterator<Item = i64>) -> Bot {
        Bot::new(
            persona,
            self.config.clone(),
            self.store(),
            Box::new(ScriptedRoller::with_ints(ints)),
        )
    }

    /// Write raw JSON over a document.
    pub fn write(&self, doc: Document, json: &str) {
        let path = self.store().path(doc);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    pub fn read(&self, doc: Document) -> serde_json::Value {
        let text = std::fs::read_to_string(self.store().path(doc)).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// A market that will not regenerate during the test.
    pub fn fresh_market(&self, items: &str) {
        let now = chrono::Utc::now().timestamp() as f64;
        let body = if items.trim().is_empty() {
            format!(r#"{{"last_update": {}}}"#, now)
        } else {
            format!(r#"{{"last_update": {}, {}}}"#, now, items)
        };
        self.write(Document::Market, &body);
    }
}

#[allow(dead_code)]
pub fn player() -> Caller {
    Caller::new("1", "Ada")
}

#[allow(dead_code)]
pub fn admin() -> Caller {
    Caller::new("900", "Gamemaster").admin(true)
}

/// All reply text joined, embeds rendered.
#[allow(dead_code)]
pub fn text(replies: &[Reply]) -> String {
    replies.iter().map(Reply::render).collect::<Vec<_>>().join("\n")
}
