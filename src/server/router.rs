use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use outreach_event_bus::StatusUpdate;
use outreach_scheduler::{
    ListRequest, RunConfig, RunControl, RunStatus, SchedulerError, StartRequest,
    DEFAULT_DELAY_SECS,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use super::state::ServeState;

type ApiError = (StatusCode, Json<Value>);

/// Body of `POST /api/start`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartForm {
    pub sheet_id: String,
    pub api_key: String,
    pub sheet_range: String,
    pub message: String,
    pub delay: Option<u64>,
}

impl StartForm {
    pub fn into_request(self) -> Result<StartRequest, SchedulerError> {
        let list = ListRequest {
            sheet_id: self.sheet_id.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            range: self.sheet_range.trim().to_string(),
        };
        let message = self.message.trim();
        if list.sheet_id.is_empty()
            || list.api_key.is_empty()
            || list.range.is_empty()
            || message.is_empty()
        {
            return Err(SchedulerError::Config(
                "Please fill in all required fields.".into(),
            ));
        }
        let config = RunConfig::new(message, self.delay.unwrap_or(DEFAULT_DELAY_SECS))?;
        Ok(StartRequest { list, config })
    }
}

pub fn build_router(state: ServeState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/start", post(start_handler))
        .route("/api/stop", post(stop_handler))
        .route("/api/skip", post(skip_handler))
        .route("/api/status", get(status_handler))
        .route("/api/events", get(events_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn start_handler(
    State(state): State<ServeState>,
    Json(form): Json<StartForm>,
) -> Result<Json<Value>, ApiError> {
    let request = form.into_request().map_err(scheduler_failure)?;
    let queued = state
        .orchestrator()
        .start(request)
        .await
        .map_err(|err| {
            warn!(error = %err, "start rejected");
            scheduler_failure(err)
        })?;
    info!(queued, "run started");
    Ok(Json(json!({ "success": true, "queued": queued })))
}

async fn stop_handler(State(state): State<ServeState>) -> Result<Json<Value>, ApiError> {
    state
        .orchestrator()
        .stop()
        .await
        .map_err(scheduler_failure)?;
    Ok(Json(json!({ "success": true })))
}

async fn skip_handler(State(state): State<ServeState>) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .orchestrator()
        .skip()
        .await
        .map_err(scheduler_failure)?;
    let mut body = json!({ "success": true });
    if let Some(message) = outcome.message() {
        body["message"] = Value::from(message);
    }
    Ok(Json(body))
}

async fn status_handler(State(state): State<ServeState>) -> Result<Json<RunStatus>, ApiError> {
    state
        .orchestrator()
        .status()
        .await
        .map(Json)
        .map_err(scheduler_failure)
}

async fn events_handler(State(state): State<ServeState>) -> impl IntoResponse {
    let mut receiver = state.orchestrator().subscribe();
    let stream = stream! {
        loop {
            match receiver.recv().await {
                Ok(update) => {
                    if let Some(event) = event_from_update(&update) {
                        yield Ok::<Event, Infallible>(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "status stream lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn event_from_update(update: &StatusUpdate) -> Option<Event> {
    match serde_json::to_string(update) {
        Ok(payload) => Some(Event::default().event("status").data(payload)),
        Err(err) => {
            warn!(?err, "failed to serialize status update");
            None
        }
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({
            "success": false,
            "error": message.into(),
        })),
    )
}

fn scheduler_failure(err: SchedulerError) -> ApiError {
    let status = match &err {
        SchedulerError::Config(_) => StatusCode::BAD_REQUEST,
        SchedulerError::AlreadyRunning | SchedulerError::NotRunning => StatusCode::CONFLICT,
        SchedulerError::EmptyWorkList => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulerError::SourceFetch(_) => StatusCode::BAD_GATEWAY,
        SchedulerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    failure(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use action_primitives::fixtures::ScriptedProvider;
    use audit_store::FileAuditStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use outreach_core_types::RunScope;
    use tower::ServiceExt;

    use crate::app_context::assemble;
    use crate::source::{parse_rows, StaticSource};

    async fn router(profiles: usize) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(
            FileAuditStore::open(dir.path().join("audit.json"))
                .await
                .unwrap(),
        );
        let rows: Vec<Vec<String>> = (0..profiles)
            .map(|n| vec![format!("https://www.linkedin.com/in/p{n}/")])
            .collect();
        let items = parse_rows(&rows, &RunScope("sheet-1".into()), "Sheet1");
        let orchestrator = assemble(
            Arc::new(ScriptedProvider::blank()),
            audit,
            Arc::new(StaticSource::new(items)),
        );
        (build_router(ServeState::new(orchestrator)), dir)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form() -> Value {
        json!({
            "sheetId": "sheet-1",
            "apiKey": "key",
            "sheetRange": "Sheet1!A2:A",
            "message": "Hi {firstName}",
            "delay": 5
        })
    }

    async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let (router, _dir) = router(1).await;
        let mut body = form();
        body["apiKey"] = json!("  ");
        let (status, json) = call(&router, post_json("/api/start", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], json!(false));
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("Please fill in all required fields."));
    }

    #[tokio::test]
    async fn short_delay_is_rejected() {
        let (router, _dir) = router(1).await;
        let mut body = form();
        body["delay"] = json!(4);
        let (status, _) = call(&router, post_json("/api/start", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_list_does_not_start() {
        let (router, _dir) = router(0).await;
        let (status, json) = call(&router, post_json("/api/start", form())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], json!("No profiles found in sheet"));

        let (_, status) = call(&router, get_request("/api/status")).await;
        assert_eq!(status["isRunning"], json!(false));
        assert_eq!(status["status"], json!("Idle"));
    }

    #[tokio::test]
    async fn start_status_and_stop() {
        let (router, _dir) = router(3).await;
        let (status, json) = call(&router, post_json("/api/start", form())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true, "queued": 3 }));

        let (status, json) = call(&router, post_json("/api/start", form())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], json!("Already running"));

        let (_, json) = call(&router, get_request("/api/status")).await;
        assert_eq!(json["isRunning"], json!(true));
        assert_eq!(json["total"], json!(3));

        let (status, json) = call(&router, post_json("/api/stop", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true }));

        let (_, json) = call(&router, get_request("/api/status")).await;
        assert_eq!(json["isRunning"], json!(false));
        assert!(json["status"].as_str().unwrap().starts_with("Stopped."));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (router, _dir) = router(1).await;
        for _ in 0..2 {
            let (status, json) = call(&router, post_json("/api/stop", json!({}))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["success"], json!(true));
        }
    }

    #[tokio::test]
    async fn skip_without_run_conflicts() {
        let (router, _dir) = router(1).await;
        let (status, json) = call(&router, post_json("/api/skip", json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], json!(false));
    }

    #[tokio::test]
    async fn skipping_the_only_item_reports_no_more() {
        let (router, _dir) = router(1).await;
        call(&router, post_json("/api/start", form())).await;
        let (status, json) = call(&router, post_json("/api/skip", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true, "message": "No more profiles" }));
    }
}
