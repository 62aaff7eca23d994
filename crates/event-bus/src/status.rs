use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::{EventBus, InMemoryBus};

/// Severity tag shown next to a status line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Running,
    Success,
    Error,
}

/// Human-readable progress broadcast. Wire shape matches the status message
/// consumed by observers: `{status, type, progress?, completed?, showSkip?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: String,
    #[serde(rename = "type")]
    pub kind: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_skip: bool,
}

impl StatusUpdate {
    pub fn new(kind: StatusKind, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            kind,
            progress: None,
            completed: false,
            show_skip: false,
        }
    }

    pub fn running(status: impl Into<String>) -> Self {
        Self::new(StatusKind::Running, status)
    }

    pub fn success(status: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, status)
    }

    pub fn error(status: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, status)
    }

    pub fn with_progress(mut self, progress: impl Into<String>) -> Self {
        self.progress = Some(progress.into());
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    pub fn with_skip(mut self) -> Self {
        self.show_skip = true;
        self
    }
}

/// Broadcast side of the status channel.
#[derive(Clone)]
pub struct StatusChannel {
    bus: Arc<InMemoryBus<StatusUpdate>>,
}

impl StatusChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            bus: InMemoryBus::new(capacity),
        }
    }

    /// Publish an update; dropped silently when no observer is attached.
    pub async fn broadcast(&self, update: StatusUpdate) {
        if let Err(err) = self.bus.publish(update).await {
            trace!(%err, "status update dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.bus.subscribe()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new(64)
    }
}
