use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Smallest pause allowed between items.
pub const MIN_DELAY_SECS: u64 = 5;

/// Pause used when the operator gives none.
pub const DEFAULT_DELAY_SECS: u64 = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Running,
    Stopping,
    Finished,
}

impl RunPhase {
    /// Whether a new run may begin from this phase.
    pub fn accepts_start(self) -> bool {
        matches!(self, RunPhase::Idle | RunPhase::Finished)
    }
}

/// Parameters fixed for the lifetime of one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
    pub message_template: String,
    pub inter_item_delay: Duration,
}

impl RunConfig {
    pub fn new(message_template: impl Into<String>, delay_secs: u64) -> Result<Self, SchedulerError> {
        if delay_secs < MIN_DELAY_SECS {
            return Err(SchedulerError::Config(format!(
                "delay must be at least {MIN_DELAY_SECS} seconds, got {delay_secs}"
            )));
        }
        Ok(Self {
            message_template: message_template.into(),
            inter_item_delay: Duration::from_secs(delay_secs),
        })
    }

    pub fn delay_secs(&self) -> u64 {
        self.inter_item_delay.as_secs()
    }
}

/// Where to read the work list from.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    pub sheet_id: String,
    pub api_key: String,
    pub range: String,
}

impl ListRequest {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.sheet_id.trim().is_empty() {
            return Err(SchedulerError::Config("sheet id is required".into()));
        }
        if self.range.trim().is_empty() {
            return Err(SchedulerError::Config("sheet range is required".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartRequest {
    pub list: ListRequest,
    pub config: RunConfig,
}

/// Result of an operator skip.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipOutcome {
    /// The next item will start after the delay.
    Advanced,
    /// The skipped item was the last one; the run finished.
    NoMoreItems,
}

impl SkipOutcome {
    pub fn message(self) -> Option<&'static str> {
        match self {
            SkipOutcome::Advanced => None,
            SkipOutcome::NoMoreItems => Some("No more profiles"),
        }
    }
}

/// Per-run outcome counts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Answer to a status query.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub is_running: bool,
    pub phase: RunPhase,
    pub status: String,
    pub progress: Option<String>,
    pub cursor: usize,
    pub total: usize,
    pub tally: OutcomeTally,
}

pub(crate) fn progress_text(cursor: usize, total: usize) -> String {
    format!("{cursor}/{total} completed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_below_minimum_is_rejected() {
        assert!(matches!(
            RunConfig::new("hi", 4),
            Err(SchedulerError::Config(_))
        ));
        let config = RunConfig::new("hi", MIN_DELAY_SECS).unwrap();
        assert_eq!(config.delay_secs(), 5);
    }

    #[test]
    fn only_idle_and_finished_accept_start() {
        assert!(RunPhase::Idle.accepts_start());
        assert!(RunPhase::Finished.accepts_start());
        assert!(!RunPhase::Running.accepts_start());
        assert!(!RunPhase::Stopping.accepts_start());
    }

    #[test]
    fn list_request_requires_sheet_and_range() {
        let mut request = ListRequest {
            sheet_id: "abc".into(),
            api_key: "key".into(),
            range: "Sheet1!A2:A".into(),
        };
        assert!(request.validate().is_ok());
        request.range.clear();
        assert!(request.validate().is_err());
    }
}
