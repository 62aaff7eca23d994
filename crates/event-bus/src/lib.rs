//! Event bus plus the status channel built on top of it.
//!
//! The status channel is one-way and best effort: progress text flows from the
//! orchestrator to whoever is listening, and nothing reads it back as state.

mod status;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use outreach_core_types::CoreError;

pub use status::{StatusChannel, StatusKind, StatusUpdate};

/// Payloads the bus can carry.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

/// Fan-out publisher; every subscriber sees every event published after it
/// subscribed.
#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<(), CoreError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-memory broadcast bus.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    /// Fails only when nobody is subscribed.
    async fn publish(&self, event: E) -> Result<(), CoreError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|err| CoreError::new(err.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}
