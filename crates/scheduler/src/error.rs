use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Already running")]
    AlreadyRunning,
    #[error("No profiles found in sheet")]
    EmptyWorkList,
    #[error("failed to fetch work list: {0}")]
    SourceFetch(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("no run in progress")]
    NotRunning,
    #[error("orchestrator is not running")]
    Unavailable,
}

impl From<SchedulerError> for outreach_core_types::CoreError {
    fn from(value: SchedulerError) -> Self {
        outreach_core_types::CoreError::new(value.to_string())
    }
}
