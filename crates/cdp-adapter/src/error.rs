use action_primitives::ActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("chromium executable not found; set OUTREACH_CHROME or browser.executable")]
    ExecutableNotFound,
    #[error("browser config error: {0}")]
    Config(String),
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("cdp failure: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("script returned unexpected data: {0}")]
    Script(#[from] serde_json::Error),
}

impl From<AdapterError> for ActionError {
    fn from(value: AdapterError) -> Self {
        match value {
            AdapterError::Script(err) => ActionError::Script(err.to_string()),
            other => ActionError::CdpIo(other.to_string()),
        }
    }
}
