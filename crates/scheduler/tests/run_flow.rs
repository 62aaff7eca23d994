use std::sync::Arc;

use action_flow::{ActuatorTransport, HostedSurfaceProvider};
use action_primitives::fixtures::{ScriptedProvider, ScriptedSurface};
use action_primitives::{DomSnapshot, ElementNode, ScopeFlags};
use async_trait::async_trait;
use extensions_bridge::{DeliveryPolicy, RetryingBridge};
use outreach_core_types::{RunScope, SourceRowRef, WorkItem};
use outreach_event_bus::{StatusChannel, StatusUpdate};
use outreach_scheduler::{
    AuditEntry, AuditLog, ListRequest, Orchestrator, OrchestratorDeps, RunConfig, RunControl,
    RunPhase, SchedulerError, SkipOutcome, SourceError, StartRequest, StorageError,
    WorkListSource, STOPPED_LABEL,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use url::Url;

#[derive(Default)]
struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
    running: Mutex<Vec<bool>>,
}

impl MemoryAudit {
    fn statuses(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .iter()
            .map(|entry| (entry.key.clone(), entry.status.clone()))
            .collect()
    }
}

#[async_trait]
impl AuditLog for MemoryAudit {
    async fn record(&self, entry: AuditEntry) -> Result<(), StorageError> {
        self.entries.lock().push(entry);
        Ok(())
    }

    async fn set_running(&self, running: bool) -> Result<(), StorageError> {
        self.running.lock().push(running);
        Ok(())
    }
}

struct FixedSource(Result<Vec<WorkItem>, SourceError>);

#[async_trait]
impl WorkListSource for FixedSource {
    async fn fetch(&self, _request: &ListRequest) -> Result<Vec<WorkItem>, SourceError> {
        self.0.clone()
    }
}

fn name() -> ElementNode {
    ElementNode::new("name", "h1")
        .with_text("Ada Lovelace")
        .in_scope(ScopeFlags::PRIMARY)
}

fn connectable() -> ScriptedSurface {
    let invite = ScopeFlags::DIALOG | ScopeFlags::INVITE;
    let profile = DomSnapshot::new(
        true,
        vec![
            name(),
            ElementNode::new("connect", "button")
                .with_aria_label("Invite Ada Lovelace to connect")
                .in_scope(ScopeFlags::PRIMARY),
        ],
    );
    let dialog = DomSnapshot::new(
        true,
        vec![
            name(),
            ElementNode::new("dialog", "div")
                .with_role("dialog")
                .with_modal_id("send-invite-modal")
                .only_in(invite | ScopeFlags::DIALOG_ROOT),
            ElementNode::new("send-bare", "button")
                .with_class("artdeco-button--primary")
                .with_text("Send without a note")
                .only_in(invite),
        ],
    );
    ScriptedSurface::new(profile)
        .on_click("connect", dialog)
        .on_click("send-bare", DomSnapshot::new(true, vec![name()]))
}

fn pending() -> ScriptedSurface {
    ScriptedSurface::new(DomSnapshot::new(
        true,
        vec![
            name(),
            ElementNode::new("pending", "button")
                .with_aria_label("Pending, click to withdraw invitation sent to Ada Lovelace")
                .in_scope(ScopeFlags::PRIMARY),
        ],
    ))
}

/// Never shows a `main` landmark, so readiness times out.
fn never_ready() -> ScriptedSurface {
    ScriptedSurface::new(DomSnapshot::default()).loading_for(u32::MAX)
}

fn surface_for(url: &Url) -> ScriptedSurface {
    let path = url.path();
    if path.contains("pending") {
        pending()
    } else if path.contains("stuck") {
        never_ready()
    } else {
        connectable()
    }
}

fn items(slugs: &[&str]) -> Vec<WorkItem> {
    slugs
        .iter()
        .enumerate()
        .map(|(index, slug)| {
            let target = Url::parse(&format!("https://www.linkedin.com/in/{slug}/")).unwrap();
            WorkItem::new(
                target,
                index,
                SourceRowRef {
                    scope: RunScope("sheet-1".into()),
                    row_index: index as u32 + 2,
                    sheet_name: "Sheet1".into(),
                },
            )
        })
        .collect()
}

struct Harness {
    orchestrator: Orchestrator,
    provider: Arc<ScriptedProvider>,
    audit: Arc<MemoryAudit>,
    updates: broadcast::Receiver<StatusUpdate>,
}

fn harness(source: Result<Vec<WorkItem>, SourceError>) -> Harness {
    let provider = Arc::new(ScriptedProvider::new(surface_for));
    let transport = ActuatorTransport::new();
    let hosted = HostedSurfaceProvider::new(provider.clone(), transport.clone());
    let audit = Arc::new(MemoryAudit::default());
    let status = StatusChannel::new(256);
    let updates = status.subscribe();
    let deps = OrchestratorDeps {
        surfaces: Arc::new(hosted),
        bridge: RetryingBridge::new(transport, DeliveryPolicy::default()),
        audit: audit.clone(),
        status,
    };
    Harness {
        orchestrator: Orchestrator::spawn(deps, Arc::new(FixedSource(source))),
        provider,
        audit,
        updates,
    }
}

fn request() -> StartRequest {
    StartRequest {
        list: ListRequest {
            sheet_id: "sheet-1".into(),
            api_key: "key".into(),
            range: "Sheet1!A2:A".into(),
        },
        config: RunConfig::new("", 5).unwrap(),
    }
}

async fn wait_for(updates: &mut broadcast::Receiver<StatusUpdate>, status: &str) -> StatusUpdate {
    loop {
        let update = updates.recv().await.unwrap();
        if update.status == status {
            return update;
        }
    }
}

async fn wait_completed(updates: &mut broadcast::Receiver<StatusUpdate>) -> StatusUpdate {
    loop {
        let update = updates.recv().await.unwrap();
        if update.completed {
            return update;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn processes_items_in_input_order() {
    let mut h = harness(Ok(items(&["ada", "grace", "alan"])));

    assert_eq!(h.orchestrator.start(request()).await.unwrap(), 3);
    let summary = wait_completed(&mut h.updates).await;
    assert_eq!(summary.status, "Complete! Processed 3 profiles.");

    let opened: Vec<String> = h
        .provider
        .opened()
        .into_iter()
        .map(|(_, url)| url.path().to_string())
        .collect();
    assert_eq!(opened, vec!["/in/ada/", "/in/grace/", "/in/alan/"]);
    assert_eq!(
        h.audit.statuses(),
        vec![
            ("sheet-1:2".to_string(), "Sent".to_string()),
            ("sheet-1:3".to_string(), "Sent".to_string()),
            ("sheet-1:4".to_string(), "Sent".to_string()),
        ]
    );
    assert!(h.provider.still_open().is_empty());
    assert_eq!(*h.audit.running.lock(), vec![true, false]);

    let status = h.orchestrator.status().await.unwrap();
    assert!(!status.is_running);
    assert_eq!(status.phase, RunPhase::Finished);
    assert_eq!(status.cursor, 3);
    assert_eq!(status.tally.sent, 3);
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_its_surface_open_while_skips_close() {
    let mut h = harness(Ok(items(&["stuck", "pending", "ada"])));

    h.orchestrator.start(request()).await.unwrap();
    wait_completed(&mut h.updates).await;

    let opened = h.provider.opened();
    assert_eq!(opened.len(), 3);
    assert_eq!(h.provider.still_open(), vec![opened[0].0.clone()]);
    assert_eq!(
        h.audit.statuses(),
        vec![
            (
                "sheet-1:2".to_string(),
                "Failed: timeout waiting for page".to_string()
            ),
            ("sheet-1:3".to_string(), "Pending".to_string()),
            ("sheet-1:4".to_string(), "Sent".to_string()),
        ]
    );

    let status = h.orchestrator.status().await.unwrap();
    assert_eq!(status.tally.failed, 1);
    assert_eq!(status.tally.skipped, 1);
    assert_eq!(status.tally.sent, 1);
}

#[tokio::test(start_paused = true)]
async fn failure_broadcast_offers_skip() {
    let mut h = harness(Ok(items(&["stuck"])));

    h.orchestrator.start(request()).await.unwrap();
    let failed = wait_for(
        &mut h.updates,
        "Failed: timeout waiting for page. Tab kept open for review.",
    )
    .await;
    assert!(failed.show_skip);
}

#[tokio::test(start_paused = true)]
async fn stop_during_third_item_reports_two_processed() {
    let slugs: Vec<String> = (0..10).map(|i| format!("person-{i}")).collect();
    let slugs: Vec<&str> = slugs.iter().map(String::as_str).collect();
    let mut h = harness(Ok(items(&slugs)));

    h.orchestrator.start(request()).await.unwrap();
    wait_for(&mut h.updates, "Opening profile 3 of 10...").await;
    h.orchestrator.stop().await.unwrap();

    let summary = wait_completed(&mut h.updates).await;
    assert_eq!(summary.status, "Stopped. Processed 2 of 10 profiles.");

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert_eq!(h.provider.opened().len(), 3);
    assert!(h.provider.still_open().is_empty());
    let third: Vec<_> = h
        .audit
        .statuses()
        .into_iter()
        .filter(|(key, _)| key == "sheet-1:4")
        .collect();
    assert_eq!(
        third,
        vec![("sheet-1:4".to_string(), STOPPED_LABEL.to_string())]
    );
    assert_eq!(h.audit.statuses().len(), 3);

    let status = h.orchestrator.status().await.unwrap();
    assert!(!status.is_running);
    assert_eq!(status.status, "Stopped. Processed 2 of 10 profiles.");

    // Stop is idempotent.
    h.orchestrator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn start_while_running_is_rejected() {
    let mut h = harness(Ok(items(&["ada", "grace"])));

    h.orchestrator.start(request()).await.unwrap();
    let before = h.orchestrator.status().await.unwrap();
    assert!(before.is_running);

    assert_eq!(
        h.orchestrator.start(request()).await,
        Err(SchedulerError::AlreadyRunning)
    );
    let after = h.orchestrator.status().await.unwrap();
    assert_eq!(after.cursor, before.cursor);
    assert_eq!(after.total, 2);

    wait_completed(&mut h.updates).await;
    assert_eq!(h.orchestrator.start(request()).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_or_failed_fetch_leaves_run_idle() {
    let h = harness(Ok(Vec::new()));
    assert_eq!(
        h.orchestrator.start(request()).await,
        Err(SchedulerError::EmptyWorkList)
    );
    let status = h.orchestrator.status().await.unwrap();
    assert_eq!(status.phase, RunPhase::Idle);
    assert_eq!(status.status, "Idle");

    let h = harness(Err(SourceError::Remote("API key not valid".into())));
    assert_eq!(
        h.orchestrator.start(request()).await,
        Err(SchedulerError::SourceFetch("API key not valid".into()))
    );
    assert!(h.audit.running.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn operator_skip_closes_surface_and_moves_on() {
    let mut h = harness(Ok(items(&["stuck", "ada"])));

    h.orchestrator.start(request()).await.unwrap();
    wait_for(&mut h.updates, "Opening profile 1 of 2...").await;
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    assert_eq!(h.orchestrator.skip().await, Ok(SkipOutcome::Advanced));
    let skipped = wait_for(&mut h.updates, "Skipped. Waiting 5s before next profile...").await;
    assert_eq!(skipped.progress.as_deref(), Some("1/2 completed"));

    let summary = wait_completed(&mut h.updates).await;
    assert_eq!(summary.status, "Complete! Processed 2 profiles.");
    assert_eq!(
        h.audit.statuses(),
        vec![("sheet-1:3".to_string(), "Sent".to_string())]
    );
    assert!(h.provider.still_open().is_empty());
}

#[tokio::test(start_paused = true)]
async fn skipping_last_item_finishes_run() {
    let mut h = harness(Ok(items(&["stuck"])));

    h.orchestrator.start(request()).await.unwrap();
    wait_for(&mut h.updates, "Opening profile 1 of 1...").await;

    let outcome = h.orchestrator.skip().await.unwrap();
    assert_eq!(outcome, SkipOutcome::NoMoreItems);
    assert_eq!(outcome.message(), Some("No more profiles"));
    let summary = wait_completed(&mut h.updates).await;
    assert_eq!(summary.status, "Complete! Processed 1 profiles.");
}

#[tokio::test]
async fn skip_without_run_is_rejected() {
    let h = harness(Ok(items(&["ada"])));
    assert_eq!(h.orchestrator.skip().await, Err(SchedulerError::NotRunning));
    h.orchestrator.stop().await.unwrap();
    assert_eq!(h.orchestrator.status().await.unwrap().phase, RunPhase::Idle);
}
