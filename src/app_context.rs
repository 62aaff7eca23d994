//! Wiring of the orchestrator to its concrete collaborators.

use std::sync::Arc;

use action_flow::{ActuatorTransport, HostedSurfaceProvider};
use action_primitives::SurfaceProvider;
use anyhow::{Context, Result};
use audit_store::FileAuditStore;
use cdp_adapter::ChromiumSurfaceProvider;
use extensions_bridge::{DeliveryPolicy, RetryingBridge};
use outreach_event_bus::StatusChannel;
use outreach_scheduler::{AuditLog, Orchestrator, OrchestratorDeps, WorkListSource};
use tracing::{info, warn};

use crate::config::AppConfig;

const STATUS_CAPACITY: usize = 256;

/// Orchestrator plus the resources it was assembled from.
pub struct AppContext {
    orchestrator: Orchestrator,
    browser: Arc<ChromiumSurfaceProvider>,
}

impl AppContext {
    /// Open the audit store, start Chromium and spawn the orchestrator.
    pub async fn launch(config: &AppConfig, source: Arc<dyn WorkListSource>) -> Result<Self> {
        let audit = open_audit_store(config).await?;
        let browser = Arc::new(
            ChromiumSurfaceProvider::launch(config.browser.clone())
                .await
                .context("failed to start Chromium")?,
        );
        let orchestrator = assemble(browser.clone(), audit, source);
        Ok(Self {
            orchestrator,
            browser,
        })
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.browser
            .shutdown()
            .await
            .context("failed to close Chromium")?;
        info!("browser closed");
        Ok(())
    }
}

/// Open the configured audit store and clear a running flag left behind by
/// a process that did not finish its run.
pub async fn open_audit_store(config: &AppConfig) -> Result<Arc<FileAuditStore>> {
    let path = config.storage.resolved_audit_path();
    let store = FileAuditStore::open(&path)
        .await
        .with_context(|| format!("failed to open audit log {}", path.display()))?;
    if store.snapshot().await.is_running {
        warn!(path = %path.display(), "previous run did not finish; resetting running flag");
        store
            .mark_running(false)
            .await
            .context("failed to reset running flag")?;
    }
    Ok(Arc::new(store))
}

/// Build an orchestrator whose actuators are hosted in-process on each surface.
pub fn assemble(
    surfaces: Arc<dyn SurfaceProvider>,
    audit: Arc<dyn AuditLog>,
    source: Arc<dyn WorkListSource>,
) -> Orchestrator {
    let transport = ActuatorTransport::new();
    let hosted = HostedSurfaceProvider::new(surfaces, transport.clone());
    let deps = OrchestratorDeps {
        surfaces: Arc::new(hosted),
        bridge: RetryingBridge::new(transport, DeliveryPolicy::default()),
        audit,
        status: StatusChannel::new(STATUS_CAPACITY),
    };
    Orchestrator::spawn(deps, source)
}
