//! Actuator command/result model shared by the bridge, the actuator and the
//! orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Command sent to the actuator running inside a surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActuatorCommand {
    SendConnection { message: String },
}

impl ActuatorCommand {
    pub fn send_connection(message: impl Into<String>) -> Self {
        Self::SendConnection {
            message: message.into(),
        }
    }
}

/// Expected, non-erroneous reasons for not sending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyConnected,
    Pending,
    FollowOnly,
}

impl SkipReason {
    /// Classification order: first match wins.
    pub const ORDERED: [SkipReason; 3] = [
        SkipReason::AlreadyConnected,
        SkipReason::Pending,
        SkipReason::FollowOnly,
    ];

    /// Machine text; also the substring matched against free-text failures.
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::AlreadyConnected => "already connected",
            SkipReason::Pending => "pending",
            SkipReason::FollowOnly => "follow only",
        }
    }

    /// Audit status label.
    pub fn label(self) -> &'static str {
        match self {
            SkipReason::AlreadyConnected => "Already Connected",
            SkipReason::Pending => "Pending",
            SkipReason::FollowOnly => "Follow Only",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an item failed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    TimeoutWaitingForPage,
    ConnectControlNotFound,
    NoResponseDialog,
    CouldNotTypeMessage,
    SendControlNotFound,
    DialogStillOpen,
    ActuatorUnreachable,
    SurfaceUnavailable,
    SurfaceOpenFailed,
    /// Free text reported by an actuator across a wire boundary.
    Reported(String),
}

impl FailureReason {
    const KNOWN: [FailureReason; 9] = [
        FailureReason::TimeoutWaitingForPage,
        FailureReason::ConnectControlNotFound,
        FailureReason::NoResponseDialog,
        FailureReason::CouldNotTypeMessage,
        FailureReason::SendControlNotFound,
        FailureReason::DialogStillOpen,
        FailureReason::ActuatorUnreachable,
        FailureReason::SurfaceUnavailable,
        FailureReason::SurfaceOpenFailed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FailureReason::TimeoutWaitingForPage => "timeout waiting for page",
            FailureReason::ConnectControlNotFound => "connect control not found",
            FailureReason::NoResponseDialog => "no response dialog",
            FailureReason::CouldNotTypeMessage => "could not type message",
            FailureReason::SendControlNotFound => "send control not found",
            FailureReason::DialogStillOpen => "dialog still open after send",
            FailureReason::ActuatorUnreachable => "actuator unreachable",
            FailureReason::SurfaceUnavailable => "surface unavailable",
            FailureReason::SurfaceOpenFailed => "could not open surface",
            FailureReason::Reported(text) => text,
        }
    }

    /// Map wire text back onto a known reason, keeping unknown text verbatim.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| FailureReason::Reported(trimmed.to_string()))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ActionOutcome {
    Success,
    KnownSkip(SkipReason),
    Failure(FailureReason),
}

/// Produced once per item by the actuator and consumed once by the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub outcome: ActionOutcome,
    pub subject_label: Option<String>,
}

impl ActionResult {
    pub fn success(subject_label: impl Into<String>) -> Self {
        Self {
            outcome: ActionOutcome::Success,
            subject_label: Some(subject_label.into()),
        }
    }

    pub fn skip(reason: SkipReason) -> Self {
        Self {
            outcome: ActionOutcome::KnownSkip(reason),
            subject_label: None,
        }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self {
            outcome: ActionOutcome::Failure(reason),
            subject_label: None,
        }
    }

    pub fn with_subject(mut self, subject_label: Option<String>) -> Self {
        self.subject_label = subject_label;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Success)
    }
}

/// Wire form of [`ActionResult`]: `{success, error?, profileName?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
}

impl From<&ActionResult> for ActuatorReply {
    fn from(result: &ActionResult) -> Self {
        let error = match &result.outcome {
            ActionOutcome::Success => None,
            ActionOutcome::KnownSkip(reason) => Some(reason.as_str().to_string()),
            ActionOutcome::Failure(reason) => Some(reason.as_str().to_string()),
        };
        Self {
            success: result.is_success(),
            error,
            profile_name: result.subject_label.clone(),
        }
    }
}

impl From<ActuatorReply> for ActionResult {
    /// Skip text arrives as a plain failure; the orchestrator reclassifies it.
    fn from(reply: ActuatorReply) -> Self {
        let outcome = if reply.success {
            ActionOutcome::Success
        } else {
            let text = reply.error.unwrap_or_else(|| "unknown".to_string());
            ActionOutcome::Failure(FailureReason::from_text(&text))
        };
        Self {
            outcome,
            subject_label: reply.profile_name,
        }
    }
}
