//! Run actor
//!
//! A single task owns the [`RunState`] and consumes one mailbox. Operator
//! commands, per-item results and delay timers all arrive as messages, so
//! state transitions never race. Per-item work (open surface, wait for load,
//! deliver the command) runs in a spawned task that posts back its result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use action_primitives::SurfaceProvider;
use extensions_bridge::RetryingBridge;
use outreach_core_types::{
    ActionOutcome, ActionResult, ActuatorCommand, FailureReason, SurfaceHandle, WorkItem,
};
use outreach_event_bus::{StatusChannel, StatusUpdate};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::classify::{classify, Classification};
use crate::error::SchedulerError;
use crate::model::{progress_text, OutcomeTally, RunConfig, RunPhase, RunStatus, SkipOutcome};
use crate::ports::{AuditEntry, AuditLog, StorageError};

/// Audit label for an in-flight item whose surface was torn down by `stop()`.
pub const STOPPED_LABEL: &str = "Stopped";

/// Bridge carrying actuator commands and structured results.
pub type ActuatorBridge = RetryingBridge<ActuatorCommand, ActionResult>;

/// Collaborators the orchestrator drives.
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub surfaces: Arc<dyn SurfaceProvider>,
    pub bridge: ActuatorBridge,
    pub audit: Arc<dyn AuditLog>,
    pub status: StatusChannel,
}

pub(crate) enum Command {
    Start {
        items: Vec<WorkItem>,
        config: RunConfig,
        reply: oneshot::Sender<Result<usize, SchedulerError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Skip {
        reply: oneshot::Sender<Result<SkipOutcome, SchedulerError>>,
    },
    Status {
        reply: oneshot::Sender<RunStatus>,
    },
    Opened {
        token: u64,
        handle: SurfaceHandle,
    },
    ItemResult {
        token: u64,
        result: ActionResult,
    },
    Advance {
        generation: u64,
    },
}

struct InFlight {
    token: u64,
    item: WorkItem,
}

struct RunState {
    phase: RunPhase,
    queue: Vec<WorkItem>,
    cursor: usize,
    config: Option<RunConfig>,
    active_surface: Option<SurfaceHandle>,
    in_flight: Option<InFlight>,
    tally: OutcomeTally,
    stopped: bool,
    summary: Option<String>,
}

impl RunState {
    fn idle() -> Self {
        Self {
            phase: RunPhase::Idle,
            queue: Vec::new(),
            cursor: 0,
            config: None,
            active_surface: None,
            in_flight: None,
            tally: OutcomeTally::default(),
            stopped: false,
            summary: None,
        }
    }

    fn running(queue: Vec<WorkItem>, config: RunConfig) -> Self {
        Self {
            phase: RunPhase::Running,
            queue,
            config: Some(config),
            ..Self::idle()
        }
    }

    fn total(&self) -> usize {
        self.queue.len()
    }

    fn delay(&self) -> Duration {
        self.config
            .as_ref()
            .map(|config| config.inter_item_delay)
            .unwrap_or_default()
    }
}

pub(crate) struct OrchestratorActor {
    deps: OrchestratorDeps,
    state: RunState,
    mailbox: mpsc::Receiver<Command>,
    mailbox_tx: mpsc::WeakSender<Command>,
    generation: u64,
    next_token: u64,
    /// Items abandoned by `stop()` whose late result is still recorded once.
    detached: HashMap<u64, WorkItem>,
}

impl OrchestratorActor {
    pub(crate) fn new(
        deps: OrchestratorDeps,
        mailbox: mpsc::Receiver<Command>,
        mailbox_tx: mpsc::WeakSender<Command>,
    ) -> Self {
        Self {
            deps,
            state: RunState::idle(),
            mailbox,
            mailbox_tx,
            generation: 0,
            next_token: 0,
            detached: HashMap::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        while let Some(command) = self.mailbox.recv().await {
            self.handle(command).await;
        }
        debug!("orchestrator mailbox closed");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start {
                items,
                config,
                reply,
            } => {
                let outcome = self.start(items, config).await;
                let _ = reply.send(outcome);
            }
            Command::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            Command::Skip { reply } => {
                let outcome = self.skip().await;
                let _ = reply.send(outcome);
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Opened { token, handle } => self.on_opened(token, handle).await,
            Command::ItemResult { token, result } => self.on_result(token, result).await,
            Command::Advance { generation } => {
                if generation == self.generation && self.state.phase == RunPhase::Running {
                    self.process_current().await;
                } else {
                    debug!(generation, current = self.generation, "stale advance ignored");
                }
            }
        }
    }

    async fn start(
        &mut self,
        items: Vec<WorkItem>,
        config: RunConfig,
    ) -> Result<usize, SchedulerError> {
        if !self.state.phase.accepts_start() {
            return Err(SchedulerError::AlreadyRunning);
        }
        if items.is_empty() {
            return Err(SchedulerError::EmptyWorkList);
        }

        let total = items.len();
        self.generation += 1;
        self.state = RunState::running(items, config);
        self.persist_running(true).await;
        info!(total, "run started");
        self.broadcast(StatusUpdate::running(format!(
            "Found {total} profiles to process"
        )))
        .await;
        self.process_current().await;
        Ok(total)
    }

    async fn process_current(&mut self) {
        if self.state.phase != RunPhase::Running || self.state.cursor >= self.state.total() {
            self.finalize().await;
            return;
        }
        let Some(config) = self.state.config.clone() else {
            self.finalize().await;
            return;
        };

        let cursor = self.state.cursor;
        let total = self.state.total();
        let item = self.state.queue[cursor].clone();
        self.next_token += 1;
        let token = self.next_token;
        self.state.in_flight = Some(InFlight {
            token,
            item: item.clone(),
        });

        info!(item = %item, "processing item");
        self.broadcast(
            StatusUpdate::running(format!("Opening profile {} of {total}...", cursor + 1))
                .with_progress(progress_text(cursor, total)),
        )
        .await;

        let Some(tx) = self.mailbox_tx.upgrade() else {
            return;
        };
        let surfaces = Arc::clone(&self.deps.surfaces);
        let bridge = self.deps.bridge.clone();
        tokio::spawn(run_item(
            surfaces,
            bridge,
            token,
            item,
            config.message_template,
            tx,
        ));
    }

    async fn on_opened(&mut self, token: u64, handle: SurfaceHandle) {
        let current = self
            .state
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.token == token);
        if current {
            self.state.active_surface = Some(handle);
        } else {
            debug!(token, surface = %handle, "surface opened for abandoned item, closing");
            self.close_surface(&handle).await;
        }
    }

    async fn on_result(&mut self, token: u64, result: ActionResult) {
        let current = self
            .state
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.token == token);

        if current && self.state.phase == RunPhase::Running {
            if let Some(flight) = self.state.in_flight.take() {
                self.complete_item(flight.item, result).await;
            }
        } else if let Some(item) = self.detached.remove(&token) {
            let label = if interrupted_by_stop(&result) {
                STOPPED_LABEL.to_string()
            } else {
                classify(&result).audit_label()
            };
            info!(item = %item, status = %label, "recording late result");
            let _ = self.record(&item, label).await;
        } else {
            debug!(token, "dropping result for skipped item");
        }
    }

    async fn complete_item(&mut self, item: WorkItem, result: ActionResult) {
        let classification = classify(&result);
        let subject = result
            .subject_label
            .clone()
            .unwrap_or_else(|| "profile".to_string());
        let recorded = self.record(&item, classification.audit_label()).await;

        let update = match &classification {
            Classification::Sent => {
                self.state.tally.sent += 1;
                match recorded {
                    Ok(()) => StatusUpdate::success(format!("Sent connection to {subject}")),
                    Err(err) => StatusUpdate::error(format!(
                        "Connected but failed to record status: {err}"
                    )),
                }
            }
            Classification::Skip(reason) => {
                self.state.tally.skipped += 1;
                StatusUpdate::running(format!("{}: {subject} - skipping", reason.label()))
            }
            Classification::Fail(reason) => {
                self.state.tally.failed += 1;
                StatusUpdate::error(format!("Failed: {reason}. Tab kept open for review."))
                    .with_skip()
            }
        };
        info!(item = %item, status = %classification.audit_label(), "item finished");
        self.broadcast(update).await;

        if let Some(handle) = self.state.active_surface.take() {
            if classification.closes_surface() {
                self.close_surface(&handle).await;
            } else {
                info!(surface = %handle, "leaving surface open for review");
            }
        }

        self.advance().await;
    }

    async fn advance(&mut self) {
        self.state.cursor += 1;
        let cursor = self.state.cursor;
        let total = self.state.total();

        if cursor < total && self.state.phase == RunPhase::Running {
            let delay = self.state.delay();
            self.broadcast(
                StatusUpdate::running(format!(
                    "Waiting {}s before next profile...",
                    delay.as_secs()
                ))
                .with_progress(progress_text(cursor, total)),
            )
            .await;
            self.schedule_advance(delay);
        } else {
            self.finalize().await;
        }
    }

    fn schedule_advance(&self, delay: Duration) {
        let Some(tx) = self.mailbox_tx.upgrade() else {
            return;
        };
        let generation = self.generation;
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(Command::Advance { generation }).await;
        });
    }

    async fn skip(&mut self) -> Result<SkipOutcome, SchedulerError> {
        if self.state.phase != RunPhase::Running {
            return Err(SchedulerError::NotRunning);
        }

        self.generation += 1;
        if let Some(flight) = self.state.in_flight.take() {
            debug!(token = flight.token, item = %flight.item, "abandoning in-flight item");
        }
        if let Some(handle) = self.state.active_surface.take() {
            self.close_surface(&handle).await;
        }

        self.state.cursor += 1;
        let cursor = self.state.cursor;
        let total = self.state.total();
        if cursor < total {
            let delay = self.state.delay();
            info!(cursor, total, "item skipped by operator");
            self.broadcast(
                StatusUpdate::running(format!(
                    "Skipped. Waiting {}s before next profile...",
                    delay.as_secs()
                ))
                .with_progress(progress_text(cursor, total)),
            )
            .await;
            self.schedule_advance(delay);
            Ok(SkipOutcome::Advanced)
        } else {
            self.finalize().await;
            Ok(SkipOutcome::NoMoreItems)
        }
    }

    async fn stop(&mut self) {
        if self.state.phase != RunPhase::Running {
            debug!(phase = ?self.state.phase, "stop ignored");
            return;
        }

        self.state.phase = RunPhase::Stopping;
        self.state.stopped = true;
        self.generation += 1;
        if let Some(flight) = self.state.in_flight.take() {
            self.detached.insert(flight.token, flight.item);
        }
        if let Some(handle) = self.state.active_surface.take() {
            self.close_surface(&handle).await;
        }
        self.finalize().await;
    }

    async fn finalize(&mut self) {
        if self.state.phase == RunPhase::Finished {
            return;
        }
        let total = self.state.total();
        let summary = if self.state.stopped {
            format!("Stopped. Processed {} of {total} profiles.", self.state.cursor)
        } else {
            format!("Complete! Processed {total} profiles.")
        };

        self.state.phase = RunPhase::Finished;
        self.state.summary = Some(summary.clone());
        self.persist_running(false).await;
        info!(
            sent = self.state.tally.sent,
            skipped = self.state.tally.skipped,
            failed = self.state.tally.failed,
            "{summary}"
        );
        self.broadcast(StatusUpdate::success(summary).completed()).await;
    }

    fn status(&self) -> RunStatus {
        let state = &self.state;
        let total = state.total();
        let status = match state.phase {
            RunPhase::Idle => "Idle".to_string(),
            RunPhase::Running | RunPhase::Stopping => format!(
                "Processing profile {} of {total}",
                (state.cursor + 1).min(total)
            ),
            RunPhase::Finished => state.summary.clone().unwrap_or_else(|| "Idle".to_string()),
        };
        let is_running = state.phase == RunPhase::Running;
        RunStatus {
            is_running,
            phase: state.phase,
            status,
            progress: is_running.then(|| progress_text(state.cursor, total)),
            cursor: state.cursor,
            total,
            tally: state.tally,
        }
    }

    async fn record(&self, item: &WorkItem, label: String) -> Result<(), StorageError> {
        let entry = AuditEntry::for_item(item, label);
        let result = self.deps.audit.record(entry).await;
        if let Err(err) = &result {
            warn!(item = %item, error = %err, "audit write failed");
        }
        result
    }

    async fn persist_running(&self, running: bool) {
        if let Err(err) = self.deps.audit.set_running(running).await {
            warn!(running, error = %err, "could not persist running flag");
        }
    }

    async fn close_surface(&self, handle: &SurfaceHandle) {
        if let Err(err) = self.deps.surfaces.close(handle).await {
            warn!(surface = %handle, error = %err, "surface close failed");
        }
    }

    async fn broadcast(&self, update: StatusUpdate) {
        self.deps.status.broadcast(update).await;
    }
}

/// Failures that follow from `stop()` closing the surface under the pipeline.
fn interrupted_by_stop(result: &ActionResult) -> bool {
    matches!(
        result.outcome,
        ActionOutcome::Failure(FailureReason::SurfaceUnavailable | FailureReason::ActuatorUnreachable)
    )
}

async fn run_item(
    surfaces: Arc<dyn SurfaceProvider>,
    bridge: ActuatorBridge,
    token: u64,
    item: WorkItem,
    message: String,
    tx: mpsc::Sender<Command>,
) {
    let result = match surfaces.open(&item.target).await {
        Ok(handle) => {
            let _ = tx
                .send(Command::Opened {
                    token,
                    handle: handle.clone(),
                })
                .await;
            dispatch(surfaces.as_ref(), &bridge, &handle, message).await
        }
        Err(err) => {
            warn!(url = %item.target, error = %err, "could not open surface");
            ActionResult::failure(FailureReason::SurfaceOpenFailed)
        }
    };
    let _ = tx.send(Command::ItemResult { token, result }).await;
}

async fn dispatch(
    surfaces: &dyn SurfaceProvider,
    bridge: &ActuatorBridge,
    handle: &SurfaceHandle,
    message: String,
) -> ActionResult {
    if let Err(err) = surfaces.wait_loaded(handle).await {
        warn!(surface = %handle, error = %err, "surface never finished loading");
        return ActionResult::failure(FailureReason::SurfaceUnavailable);
    }
    match bridge
        .deliver(handle, ActuatorCommand::send_connection(message))
        .await
    {
        Ok(result) => result,
        Err(err) => {
            warn!(surface = %handle, error = %err, "actuator unreachable");
            ActionResult::failure(FailureReason::ActuatorUnreachable)
        }
    }
}
