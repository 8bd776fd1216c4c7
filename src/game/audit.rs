//! Transaction audit log (`inventory_logs.json`), newest entries last on disk.

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logutil::escape_log;

pub const DEFAULT_AUDIT_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// RFC 3339 UTC time.
    pub timestamp: String,
    pub user: String,
    pub action: String,
    pub item: String,
    pub price_gp: u64,
}

impl AuditEntry {
    pub fn new(user: &str, action: &str, item: &str, price_gp: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339(),
            user: user.to_string(),
            action: action.to_string(),
            item: item.to_string(),
            price_gp,
        }
    }

    /// Date part of the timestamp.
    pub fn date(&self) -> &str {
        self.timestamp.split('T').next().unwrap_or(&self.timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog(Vec<AuditEntry>);

impl AuditLog {
    /// Append an entry and drop the oldest beyond `cap`.
    pub fn record(&mut self, entry: AuditEntry, cap: usize) {
        info!(
            target: "audit",
            "{} {} {} for {}gp",
            escape_log(&entry.user),
            entry.action,
            escape_log(&entry.item),
            entry.price_gp
        );
        self.0.push(entry);
        if self.0.len() > cap {
            let excess = self.0.len() - cap;
            self.0.drain(..excess);
        }
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&AuditEntry> {
        self.0.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_capped_to_newest_entries() {
        let mut log = AuditLog::default();
        for i in 0..60 {
            log.record(AuditEntry::new("u", "bought", &format!("item{}", i), 1), DEFAULT_AUDIT_CAP);
        }
        assert_eq!(log.len(), 50);
        let recent = log.recent(3);
        assert_eq!(recent[0].item, "item59");
        assert_eq!(recent[2].item, "item57");
    }

    #[test]
    fn legacy_entries_without_id_parse() {
        let raw = r#"[{"timestamp": "2025-02-01T10:00:00", "user": "bob", "action": "sold", "item": "rope", "price_gp": 0}]"#;
        let log: AuditLog = serde_json::from_str(raw).unwrap();
        assert_eq!(log.recent(10)[0].date(), "2025-02-01");
    }
}
