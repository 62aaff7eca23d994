//! Hosting actuators inside surfaces.
//!
//! [`HostedSurfaceProvider`] wraps a real provider and attaches an actuator
//! listener to each surface once it reports loaded, the way a page-side script
//! becomes reachable only after the page finishes loading. Closing the surface
//! detaches the listener again.

use std::sync::Arc;

use action_primitives::{ActionError, Surface, SurfaceProvider};
use async_trait::async_trait;
use extensions_bridge::{InProcessTransport, Listener};
use outreach_core_types::{ActionResult, ActuatorCommand, ActuatorReply, SurfaceHandle};
use tracing::debug;
use url::Url;

use crate::executor::{Actuator, SurfaceActuator};
use crate::types::ActuatorTimings;

/// In-process transport carrying actuator commands and structured results.
pub type ActuatorTransport = InProcessTransport<ActuatorCommand, ActionResult>;

/// Bridge listener answering commands with the actuator pipeline.
pub struct ActuatorListener {
    actuator: SurfaceActuator,
}

impl ActuatorListener {
    pub fn new(actuator: SurfaceActuator) -> Self {
        Self { actuator }
    }
}

#[async_trait]
impl Listener<ActuatorCommand, ActionResult> for ActuatorListener {
    async fn handle(&self, command: ActuatorCommand) -> ActionResult {
        let result = self.actuator.perform(&command).await;
        debug!(reply = ?ActuatorReply::from(&result), "actuator replied");
        result
    }
}

/// Provider decorator that hosts one actuator per loaded surface.
pub struct HostedSurfaceProvider {
    inner: Arc<dyn SurfaceProvider>,
    transport: Arc<ActuatorTransport>,
    timings: ActuatorTimings,
}

impl HostedSurfaceProvider {
    pub fn new(inner: Arc<dyn SurfaceProvider>, transport: Arc<ActuatorTransport>) -> Self {
        Self::with_timings(inner, transport, ActuatorTimings::default())
    }

    pub fn with_timings(
        inner: Arc<dyn SurfaceProvider>,
        transport: Arc<ActuatorTransport>,
        timings: ActuatorTimings,
    ) -> Self {
        Self {
            inner,
            transport,
            timings,
        }
    }

    pub fn transport(&self) -> &Arc<ActuatorTransport> {
        &self.transport
    }
}

#[async_trait]
impl SurfaceProvider for HostedSurfaceProvider {
    async fn open(&self, target: &Url) -> Result<SurfaceHandle, ActionError> {
        self.inner.open(target).await
    }

    async fn wait_loaded(&self, handle: &SurfaceHandle) -> Result<(), ActionError> {
        self.inner.wait_loaded(handle).await?;
        if let Some(surface) = self.inner.surface(handle) {
            let actuator = SurfaceActuator::with_timings(surface, self.timings);
            self.transport
                .attach(handle.clone(), Arc::new(ActuatorListener::new(actuator)));
        }
        Ok(())
    }

    fn surface(&self, handle: &SurfaceHandle) -> Option<Arc<dyn Surface>> {
        self.inner.surface(handle)
    }

    async fn close(&self, handle: &SurfaceHandle) -> Result<(), ActionError> {
        self.transport.detach(handle);
        self.inner.close(handle).await
    }
}
