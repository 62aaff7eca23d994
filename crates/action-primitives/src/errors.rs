//! Error types for surface operations

use thiserror::Error;

/// Errors raised by a surface or surface provider.
///
/// None of these escape the actuator pipeline; it maps them onto a failure
/// outcome instead.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Navigation did not complete in time
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// Element reference no longer points at a live element
    #[error("Element detached: {0}")]
    Detached(String),

    /// Surface handle unknown or already closed
    #[error("Surface closed: {0}")]
    SurfaceClosed(String),

    /// Browser protocol or transport failure
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Script evaluation returned something unexpected
    #[error("Script error: {0}")]
    Script(String),
}

impl ActionError {
    /// The surface is gone for good; further calls will fail the same way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionError::SurfaceClosed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_closed_surface_is_terminal() {
        assert!(ActionError::SurfaceClosed("surface:1".into()).is_terminal());
        assert!(!ActionError::Detached("ref-3".into()).is_terminal());
        assert!(!ActionError::NavTimeout("surface:2".into()).is_terminal());
    }
}
