use std::sync::Arc;

use async_trait::async_trait;
use outreach_event_bus::{StatusChannel, StatusUpdate};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};

use crate::error::SchedulerError;
use crate::model::{RunStatus, SkipOutcome, StartRequest};
use crate::orchestrator::{Command, OrchestratorActor, OrchestratorDeps};
use crate::ports::WorkListSource;

const MAILBOX_CAPACITY: usize = 64;

/// Operator-facing control surface of a run.
#[async_trait]
pub trait RunControl: Send + Sync {
    /// Fetch the list and begin processing. Returns the number of items queued.
    async fn start(&self, request: StartRequest) -> Result<usize, SchedulerError>;
    async fn stop(&self) -> Result<(), SchedulerError>;
    async fn skip(&self) -> Result<SkipOutcome, SchedulerError>;
    async fn status(&self) -> Result<RunStatus, SchedulerError>;
}

/// Cloneable handle to the run actor.
#[derive(Clone)]
pub struct Orchestrator {
    tx: mpsc::Sender<Command>,
    source: Arc<dyn WorkListSource>,
    status: StatusChannel,
}

impl Orchestrator {
    /// Spawn the actor on the current runtime.
    pub fn spawn(deps: OrchestratorDeps, source: Arc<dyn WorkListSource>) -> Self {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let status = deps.status.clone();
        let actor = OrchestratorActor::new(deps, rx, tx.downgrade());
        tokio::spawn(actor.run());
        Self { tx, source, status }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.status.subscribe()
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SchedulerError::Unavailable)?;
        rx.await.map_err(|_| SchedulerError::Unavailable)
    }
}

#[async_trait]
impl RunControl for Orchestrator {
    async fn start(&self, request: StartRequest) -> Result<usize, SchedulerError> {
        request.list.validate()?;
        if self.status().await?.is_running {
            return Err(SchedulerError::AlreadyRunning);
        }

        let items = self.source.fetch(&request.list).await.map_err(|err| {
            warn!(error = %err, "work list fetch failed");
            SchedulerError::SourceFetch(err.to_string())
        })?;
        if items.is_empty() {
            return Err(SchedulerError::EmptyWorkList);
        }
        info!(count = items.len(), "work list fetched");

        let config = request.config;
        self.call(|reply| Command::Start {
            items,
            config,
            reply,
        })
        .await?
    }

    async fn stop(&self) -> Result<(), SchedulerError> {
        self.call(|reply| Command::Stop { reply }).await
    }

    async fn skip(&self) -> Result<SkipOutcome, SchedulerError> {
        self.call(|reply| Command::Skip { reply }).await?
    }

    async fn status(&self) -> Result<RunStatus, SchedulerError> {
        self.call(|reply| Command::Status { reply }).await
    }
}
