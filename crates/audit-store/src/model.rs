use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use outreach_scheduler::AuditEntry;
use serde::{Deserialize, Serialize};

/// Stored value for one audit key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub status: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub url: String,
}

impl AuditRecord {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }

    /// ISO-8601 with millisecond precision, `Z` suffix.
    pub fn iso_timestamp(&self) -> String {
        self.recorded_at()
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default()
    }
}

impl From<&AuditEntry> for AuditRecord {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            status: entry.status.clone(),
            timestamp: entry.recorded_at.timestamp_millis(),
            url: entry.target.to_string(),
        }
    }
}

/// Whole persisted document. Keys are `<scope>:<rowIndex>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDocument {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub entries: BTreeMap<String, AuditRecord>,
}

/// Row number portion of an audit key.
pub fn row_of(key: &str) -> &str {
    key.rsplit_once(':').map(|(_, row)| row).unwrap_or(key)
}
