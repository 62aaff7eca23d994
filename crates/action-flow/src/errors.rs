//! Pipeline halt conditions

use action_primitives::ActionError;
use outreach_core_types::{ActionResult, FailureReason, SkipReason};
use thiserror::Error;

/// Why the pipeline stopped before completing.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A recognised relationship state; the item needs no action
    #[error("skipped: {0}")]
    Skip(SkipReason),

    /// A stage could not complete
    #[error("failed: {0}")]
    Failed(FailureReason),

    /// The surface itself misbehaved
    #[error("surface error: {0}")]
    Surface(#[from] ActionError),
}

impl FlowError {
    /// Map the halt onto the result reported for the item.
    pub fn into_result(self) -> ActionResult {
        match self {
            FlowError::Skip(reason) => ActionResult::skip(reason),
            FlowError::Failed(reason) => ActionResult::failure(reason),
            FlowError::Surface(_) => ActionResult::failure(FailureReason::SurfaceUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core_types::ActionOutcome;

    #[test]
    fn surface_errors_degrade_to_failure() {
        let result = FlowError::from(ActionError::SurfaceClosed("page".into())).into_result();
        assert_eq!(
            result.outcome,
            ActionOutcome::Failure(FailureReason::SurfaceUnavailable)
        );
    }
}
