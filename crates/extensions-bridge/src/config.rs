//! Delivery policy configuration.

use std::time::Duration;

use action_primitives::RetryPolicy;
use serde::{Deserialize, Serialize};

/// How hard the bridge tries to reach a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPolicy {
    /// Delivery attempts before giving up.
    pub attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub interval_ms: u64,
    /// Upper bound on waiting for a reply once delivered. `None` waits for as
    /// long as the listener takes.
    pub reply_timeout_ms: Option<u64>,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            interval_ms: 1_000,
            reply_timeout_ms: None,
        }
    }
}

impl DeliveryPolicy {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.interval_ms))
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }
}
