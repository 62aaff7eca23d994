//! Run orchestration
//!
//! Sequences work items strictly one at a time: open a surface, hand the
//! actuator a command, classify the result, record it, pause, repeat. The
//! operator can stop or skip at any point and query progress.

pub mod api;
pub mod classify;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod ports;

pub use api::{Orchestrator, RunControl};
pub use classify::{classify, skip_from_text, Classification};
pub use error::SchedulerError;
pub use model::{
    ListRequest, OutcomeTally, RunConfig, RunPhase, RunStatus, SkipOutcome, StartRequest,
    DEFAULT_DELAY_SECS, MIN_DELAY_SECS,
};
pub use orchestrator::{ActuatorBridge, OrchestratorDeps, STOPPED_LABEL};
pub use ports::{AuditEntry, AuditLog, SourceError, StorageError, WorkListSource};
