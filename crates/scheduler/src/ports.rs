//! Ports to the collaborators the orchestrator does not own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core_types::WorkItem;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ListRequest;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("{0}")]
    Remote(String),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Supplies the ordered work list for a run.
#[async_trait]
pub trait WorkListSource: Send + Sync {
    async fn fetch(&self, request: &ListRequest) -> Result<Vec<WorkItem>, SourceError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("storage write failed: {0}")]
pub struct StorageError(pub String);

/// One persisted status record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// `<scope>:<rowIndex>`
    pub key: String,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub target: Url,
}

impl AuditEntry {
    pub fn for_item(item: &WorkItem, status: impl Into<String>) -> Self {
        Self {
            key: item.source_row.audit_key(),
            status: status.into(),
            recorded_at: Utc::now(),
            target: item.target.clone(),
        }
    }
}

/// Append/overwrite store for item outcomes plus the persisted running flag.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), StorageError>;

    async fn set_running(&self, running: bool) -> Result<(), StorageError>;
}
