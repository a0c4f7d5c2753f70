//! Exercises the spreadsheet adapter against a local stand-in for the web app.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use production_tracker_core::domain::{FetchAction, SaveAction};
use production_tracker_core::ports::RemoteStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracker_lib::adapters::SheetsAdapter;

#[derive(Default)]
struct Recorded {
    queries: Mutex<Vec<HashMap<String, String>>>,
    posts: Mutex<Vec<Value>>,
}

async fn fake_get(
    State(recorded): State<Arc<Recorded>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let action = query.get("action").cloned().unwrap_or_default();
    recorded.queries.lock().unwrap().push(query);
    match action.as_str() {
        "getProduction" => (StatusCode::OK, r#"[{"id":"p1","date":"2025-06-01"}]"#.to_string()),
        "getLogs" => (StatusCode::OK, "<html>not json</html>".to_string()),
        "getUsers" => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        _ => (StatusCode::OK, "[]".to_string()),
    }
}

async fn fake_post(
    State(recorded): State<Arc<Recorded>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    recorded.posts.lock().unwrap().push(body);
    // The real endpoint is not reliable about statuses; saves must not care.
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_fake() -> (String, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let app = Router::new()
        .route("/exec", get(fake_get).post(fake_post))
        .with_state(recorded.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/exec"), recorded)
}

async fn adapter() -> (SheetsAdapter, Arc<Recorded>) {
    let (url, recorded) = spawn_fake().await;
    let sheets = SheetsAdapter::new(Duration::from_secs(5)).unwrap();
    sheets.set_endpoint(Some(url));
    (sheets, recorded)
}

#[tokio::test]
async fn fetch_sends_action_and_cache_busters() {
    let (sheets, recorded) = adapter().await;

    let payload = sheets.fetch(FetchAction::GetProduction).await;

    assert_eq!(payload, Some(json!([{"id": "p1", "date": "2025-06-01"}])));
    let queries = recorded.queries.lock().unwrap();
    assert_eq!(queries[0]["action"], "getProduction");
    assert!(queries[0]["_t"].parse::<i64>().is_ok());
    assert_eq!(queries[0]["_s"].len(), 6);
}

#[tokio::test]
async fn fetch_yields_nothing_on_error_status_or_bad_json() {
    let (sheets, _) = adapter().await;

    assert_eq!(sheets.fetch(FetchAction::GetUsers).await, None);
    assert_eq!(sheets.fetch(FetchAction::GetLogs).await, None);
}

#[tokio::test]
async fn save_posts_envelope_and_ignores_status() {
    let (sheets, recorded) = adapter().await;

    let dispatched = sheets
        .save(SaveAction::SaveOffDays, json!([{"id": "od1"}]))
        .await;

    assert!(dispatched);
    let posts = recorded.posts.lock().unwrap();
    assert_eq!(posts[0]["action"], "saveOffDays");
    assert_eq!(posts[0]["data"], json!([{"id": "od1"}]));
    assert!(posts[0]["timestamp"].is_i64());
}

#[tokio::test]
async fn unreachable_endpoint_fails_quietly() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sheets = SheetsAdapter::new(Duration::from_secs(2)).unwrap();
    sheets.set_endpoint(Some(format!("http://{addr}/exec")));

    assert_eq!(sheets.fetch(FetchAction::GetOffDays).await, None);
    assert!(!sheets.save(SaveAction::SaveLogs, json!([])).await);
}

#[tokio::test]
async fn disabled_adapter_does_nothing() {
    let sheets = SheetsAdapter::new(Duration::from_secs(2)).unwrap();

    assert!(!sheets.is_enabled());
    assert_eq!(sheets.fetch(FetchAction::GetProduction).await, None);
    assert!(!sheets.save(SaveAction::SaveUsers, json!([])).await);
}
