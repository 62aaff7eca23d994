//! Bounded polling with timing parameters kept as data.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

/// Retry/poll schedule: an optional settle delay, then up to `max_attempts`
/// checks spaced `interval` apart, cut short by `timeout` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub settle: Option<Duration>,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            timeout: None,
            settle: None,
        }
    }

    /// Poll every `interval` until `timeout` elapses.
    pub const fn deadline(timeout: Duration, interval: Duration) -> Self {
        Self {
            max_attempts: u32::MAX,
            interval,
            timeout: Some(timeout),
            settle: None,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = Some(settle);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            PollOutcome::Ready { value, .. } => Some(value),
            PollOutcome::Exhausted { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::Exhausted { attempts } => *attempts,
        }
    }
}

/// Run `probe` until it yields `Some`, sleeping between attempts.
///
/// The probe runs at least once. No sleep follows the final attempt.
pub async fn poll_until<T, F, Fut>(policy: &RetryPolicy, mut probe: F) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    if let Some(settle) = policy.settle {
        sleep(settle).await;
    }
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        if let Some(value) = probe(attempt).await {
            return PollOutcome::Ready {
                value,
                attempts: attempt,
            };
        }
        trace!(attempt, "poll attempt came back empty");
        if attempt >= max_attempts {
            return PollOutcome::Exhausted { attempts: attempt };
        }
        if let Some(limit) = policy.timeout {
            if started.elapsed() + policy.interval > limit {
                return PollOutcome::Exhausted { attempts: attempt };
            }
        }
        sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_success() {
        let policy = RetryPolicy::new(8, Duration::from_millis(750));
        let outcome = poll_until(&policy, |attempt| async move {
            (attempt == 3).then_some("dialog")
        })
        .await;
        assert_eq!(
            outcome,
            PollOutcome::Ready {
                value: "dialog",
                attempts: 3
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let started = Instant::now();
        let outcome: PollOutcome<()> = poll_until(&policy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { None }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_policy_respects_timeout() {
        let policy = RetryPolicy::deadline(Duration::from_secs(10), Duration::from_millis(250));
        let started = Instant::now();
        let outcome: PollOutcome<()> = poll_until(&policy, |_| async { None }).await;
        assert!(matches!(outcome, PollOutcome::Exhausted { .. }));
        assert!(started.elapsed() <= Duration::from_secs(10));
        assert!(started.elapsed() >= Duration::from_millis(9750));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_runs_before_first_probe() {
        let policy =
            RetryPolicy::new(1, Duration::from_millis(750)).with_settle(Duration::from_secs(1));
        let started = Instant::now();
        let outcome = poll_until(&policy, |_| async { Some(()) }).await;
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }
}
