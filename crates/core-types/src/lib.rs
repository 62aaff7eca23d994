//! Shared primitives for the outreach workspace.

pub mod outcome;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

pub use outcome::{
    ActionOutcome, ActionResult, ActuatorCommand, ActuatorReply, FailureReason, SkipReason,
};

/// Shared error type for cross-crate plumbing.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Opaque handle for one open rendering surface (a browser page).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub String);

impl SurfaceHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SurfaceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface:{}", self.0)
    }
}

/// Identifies the list a run was built from. Audit keys are namespaced by it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunScope(pub String);

impl fmt::Display for RunScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Back-reference to the source row a work item came from.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SourceRowRef {
    pub scope: RunScope,
    /// 1-based row number as the operator sees it in the source sheet.
    pub row_index: u32,
    pub sheet_name: String,
}

impl SourceRowRef {
    /// Audit key in `<scope>:<rowIndex>` form.
    pub fn audit_key(&self) -> String {
        format!("{}:{}", self.scope.0, self.row_index)
    }
}

/// One queued unit of work. Immutable once enqueued.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub target: Url,
    pub sequence_index: usize,
    pub source_row: SourceRowRef,
}

impl WorkItem {
    pub fn new(target: Url, sequence_index: usize, source_row: SourceRowRef) -> Self {
        Self {
            target,
            sequence_index,
            source_row,
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} row={} {}",
            self.sequence_index, self.source_row.row_index, self.target
        )
    }
}
