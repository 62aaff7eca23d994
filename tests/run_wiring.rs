use std::sync::Arc;
use std::time::Duration;

use action_primitives::fixtures::{ScriptedProvider, ScriptedSurface};
use action_primitives::{DomSnapshot, ElementNode, ScopeFlags};
use audit_store::FileAuditStore;
use outreach_cli::{assemble, parse_rows, StaticSource};
use outreach_core_types::RunScope;
use outreach_event_bus::StatusUpdate;
use outreach_scheduler::{ListRequest, RunConfig, RunControl, StartRequest};
use tokio::sync::broadcast;
use tokio::time::timeout;
use url::Url;

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

fn surface_for(url: &Url) -> ScriptedSurface {
    if url.path().contains("pending") {
        pending()
    } else {
        connectable()
    }
}

async fn wait_for_completion(updates: &mut broadcast::Receiver<StatusUpdate>) -> Vec<String> {
    let mut seen = Vec::new();
    let drained = timeout(Duration::from_secs(60), async {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    seen.push(update.status.clone());
                    if update.completed {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "run did not finish: {seen:?}");
    seen
}

#[tokio::test]
async fn outcomes_reach_the_audit_file_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.json");
    let audit = Arc::new(FileAuditStore::open(&audit_path).await.unwrap());

    let rows = vec![
        vec!["Profile".to_string()],
        vec!["https://www.linkedin.com/in/ada/".to_string()],
        vec!["https://www.linkedin.com/in/pending-grace/".to_string()],
    ];
    let items = parse_rows(&rows, &RunScope("sheet-9".into()), "Sheet1");
    assert_eq!(items.len(), 2);

    let provider = Arc::new(ScriptedProvider::new(surface_for));
    let orchestrator = assemble(
        provider.clone(),
        audit.clone(),
        Arc::new(StaticSource::new(items)),
    );
    let mut updates = orchestrator.subscribe();

    let queued = orchestrator
        .start(StartRequest {
            list: ListRequest {
                sheet_id: "sheet-9".into(),
                api_key: "unused".into(),
                range: "Sheet1!A2:A".into(),
            },
            config: RunConfig::new("", 5).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(queued, 2);

    let seen = wait_for_completion(&mut updates).await;
    assert_eq!(seen.first().map(String::as_str), Some("Found 2 profiles to process"));
    assert_eq!(seen.last().map(String::as_str), Some("Complete! Processed 2 profiles."));

    assert_eq!(audit.get("sheet-9:3").await.unwrap().status, "Sent");
    assert_eq!(audit.get("sheet-9:4").await.unwrap().status, "Pending");
    assert!(provider.still_open().is_empty());
    assert!(!audit.snapshot().await.is_running);

    let reopened = FileAuditStore::open(&audit_path).await.unwrap();
    let csv = reopened.export_csv().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Row,URL,Status,Timestamp");
    assert!(lines[1].starts_with("3,\"https://www.linkedin.com/in/ada/\",\"Sent\","));
    assert!(lines[2].starts_with("4,\"https://www.linkedin.com/in/pending-grace/\",\"Pending\","));
}
