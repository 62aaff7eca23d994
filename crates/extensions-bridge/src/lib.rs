//! Messaging bridge between the orchestrator and page-side actuators.
//!
//! A request is addressed to a surface handle. The page may not have an active
//! listener yet (content still loading), so delivery is retried on a fixed
//! schedule before the bridge gives up. Transports are swappable; the
//! in-process transport serves both production and tests.

pub mod config;
mod transport;

pub use config::DeliveryPolicy;
pub use transport::{InProcessTransport, Listener, Transport};

use std::sync::Arc;

use action_primitives::{poll_until, PollOutcome};
use outreach_core_types::SurfaceHandle;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Errors surfaced by the bridge.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no listener attached to {0}")]
    NoListener(String),
    #[error("channel closed")]
    ChannelClosed,
    #[error("timeout waiting for reply")]
    Timeout,
    #[error("listener unreachable after {attempts} attempts: {last}")]
    Unreachable { attempts: u32, last: String },
}

impl BridgeError {
    /// Whether another delivery attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::NoListener(_) | BridgeError::ChannelClosed)
    }
}

/// Request/response bridge with bounded delivery retry.
pub struct RetryingBridge<Req, Resp> {
    transport: Arc<dyn Transport<Req, Resp>>,
    policy: DeliveryPolicy,
}

impl<Req, Resp> Clone for RetryingBridge<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
        }
    }
}

impl<Req, Resp> RetryingBridge<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + 'static,
{
    pub fn new(transport: Arc<dyn Transport<Req, Resp>>, policy: DeliveryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Deliver `request` to the listener behind `target` and await its reply.
    ///
    /// Delivery failures are retried per the policy. A delivered request that
    /// times out is not resent, since the listener may already be acting on it.
    pub async fn deliver(&self, target: &SurfaceHandle, request: Req) -> Result<Resp, BridgeError> {
        let retry = self.policy.retry_policy();
        let max_attempts = retry.max_attempts.max(1);
        let request = &request;

        let outcome = poll_until(&retry, |attempt| async move {
            match self.send_once(target, request.clone()).await {
                Ok(reply) => {
                    debug!(%target, attempt, "bridge delivered request");
                    Some(Ok(reply))
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    debug!(%target, attempt, error = %err, "delivery failed, retrying");
                    None
                }
                Err(err) if err.is_retryable() => {
                    warn!(%target, attempts = attempt, error = %err, "listener unreachable");
                    Some(Err(BridgeError::Unreachable {
                        attempts: attempt,
                        last: err.to_string(),
                    }))
                }
                Err(err) => {
                    warn!(%target, error = %err, "bridge request failed");
                    Some(Err(err))
                }
            }
        })
        .await;

        match outcome {
            PollOutcome::Ready { value, .. } => value,
            PollOutcome::Exhausted { attempts } => Err(BridgeError::Unreachable {
                attempts,
                last: "delivery schedule exhausted".into(),
            }),
        }
    }

    async fn send_once(&self, target: &SurfaceHandle, request: Req) -> Result<Resp, BridgeError> {
        let send = self.transport.send(target, request);
        match self.policy.reply_timeout() {
            Some(limit) => timeout(limit, send)
                .await
                .unwrap_or(Err(BridgeError::Timeout)),
            None => send.await,
        }
    }
}
