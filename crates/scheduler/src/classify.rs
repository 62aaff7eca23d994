//! Outcome classification.

use outreach_core_types::{ActionOutcome, ActionResult, SkipReason};

/// What the orchestrator does with a result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Sent,
    Skip(SkipReason),
    Fail(String),
}

impl Classification {
    /// Status label written to the audit log.
    pub fn audit_label(&self) -> String {
        match self {
            Classification::Sent => "Sent".to_string(),
            Classification::Skip(reason) => reason.label().to_string(),
            Classification::Fail(reason) => format!("Failed: {reason}"),
        }
    }

    /// Whether the surface is closed before advancing.
    pub fn closes_surface(&self) -> bool {
        !matches!(self, Classification::Fail(_))
    }
}

/// Match free failure text against the auto-skip table; first match wins.
pub fn skip_from_text(text: &str) -> Option<SkipReason> {
    let lowered = text.to_lowercase();
    SkipReason::ORDERED
        .into_iter()
        .find(|reason| lowered.contains(reason.as_str()))
}

pub fn classify(result: &ActionResult) -> Classification {
    match &result.outcome {
        ActionOutcome::Success => Classification::Sent,
        ActionOutcome::KnownSkip(reason) => Classification::Skip(*reason),
        ActionOutcome::Failure(reason) => match skip_from_text(reason.as_str()) {
            Some(skip) => Classification::Skip(skip),
            None => Classification::Fail(reason.as_str().to_string()),
        },
    }
}
