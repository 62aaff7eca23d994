//! Pipeline stages and their timing parameters

use std::time::Duration;

use action_primitives::RetryPolicy;
use serde::Serialize;

/// Fixed pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Readiness,
    Precheck,
    PrimaryAction,
    DialogWait,
    Note,
    Confirm,
    Verify,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Readiness => "readiness",
            Stage::Precheck => "precheck",
            Stage::PrimaryAction => "primary_action",
            Stage::DialogWait => "dialog_wait",
            Stage::Note => "note",
            Stage::Confirm => "confirm",
            Stage::Verify => "verify",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every wait the actuator performs, expressed as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorTimings {
    /// Poll for the `main` landmark.
    pub readiness: RetryPolicy,
    /// Pause after opening the disclosure menu.
    pub menu_open: Duration,
    /// Pause after dismissing the disclosure menu.
    pub menu_dismiss: Duration,
    /// Settle, then poll for the response dialog.
    pub dialog: RetryPolicy,
    /// Pause for dialog content to render before the note stage.
    pub dialog_render: Duration,
    /// Settle after the note toggle, then poll for the field.
    pub note_field: RetryPolicy,
    /// Pause between filling the field and reading it back.
    pub note_readback: Duration,
    /// Attempts to find an enabled send control.
    pub send: RetryPolicy,
    /// Pause after clicking send, before verification.
    pub verify_settle: Duration,
}

impl Default for ActuatorTimings {
    fn default() -> Self {
        Self {
            readiness: RetryPolicy::deadline(Duration::from_secs(10), Duration::from_millis(250)),
            menu_open: Duration::from_millis(800),
            menu_dismiss: Duration::from_millis(300),
            dialog: RetryPolicy::new(8, Duration::from_millis(750))
                .with_settle(Duration::from_secs(1)),
            dialog_render: Duration::from_millis(500),
            note_field: RetryPolicy::new(3, Duration::from_millis(300))
                .with_settle(Duration::from_millis(800)),
            note_readback: Duration::from_millis(200),
            send: RetryPolicy::new(3, Duration::from_millis(500))
                .with_settle(Duration::from_millis(500)),
            verify_settle: Duration::from_secs(1),
        }
    }
}
