use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use outreach_core_types::SurfaceHandle;
use tracing::debug;

use crate::BridgeError;

/// One-shot request/response carrier addressed by surface handle.
#[async_trait]
pub trait Transport<Req, Resp>: Send + Sync {
    async fn send(&self, target: &SurfaceHandle, request: Req) -> Result<Resp, BridgeError>;
}

/// Receiving end living inside a surface.
#[async_trait]
pub trait Listener<Req, Resp>: Send + Sync {
    async fn handle(&self, request: Req) -> Resp;
}

/// Transport that routes requests to listeners registered in this process.
pub struct InProcessTransport<Req, Resp> {
    listeners: DashMap<SurfaceHandle, Arc<dyn Listener<Req, Resp>>>,
}

impl<Req, Resp> Default for InProcessTransport<Req, Resp> {
    fn default() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }
}

impl<Req, Resp> InProcessTransport<Req, Resp> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attach(&self, target: SurfaceHandle, listener: Arc<dyn Listener<Req, Resp>>) {
        debug!(%target, "listener attached");
        self.listeners.insert(target, listener);
    }

    pub fn detach(&self, target: &SurfaceHandle) -> bool {
        let removed = self.listeners.remove(target).is_some();
        if removed {
            debug!(%target, "listener detached");
        }
        removed
    }

    pub fn is_attached(&self, target: &SurfaceHandle) -> bool {
        self.listeners.contains_key(target)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl<Req, Resp> Transport<Req, Resp> for InProcessTransport<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn send(&self, target: &SurfaceHandle, request: Req) -> Result<Resp, BridgeError> {
        // Clone out of the map so no shard lock is held across the await.
        let listener = self
            .listeners
            .get(target)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BridgeError::NoListener(target.to_string()))?;
        Ok(listener.handle(request).await)
    }
}
