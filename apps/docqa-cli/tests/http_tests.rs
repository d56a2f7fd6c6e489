use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use docqa_cli::http::router;
use docqa_core::config::Settings;
use docqa_engine::RagService;

fn app() -> axum::Router {
    let service = RagService::from_settings(Settings::default()).expect("default settings are valid");
    router(Arc::new(service))
}

async fn send(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => request.body(Body::empty()).expect("request"),
    };
    let response = app.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, value)
}

fn door_doc() -> Value {
    json!({
        "fileName": "hangar/doors/main_door.txt",
        "system": "hangar",
        "subsystem": "doors",
        "content": "Door Width: 1.3 meters. The main hangar door opens with the hydraulic lever."
    })
}

#[tokio::test]
async fn health_reports_empty_index() {
    let (status, body) = send(app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["totalChunks"], 0);
}

#[tokio::test]
async fn ingest_then_stats_and_query() {
    let app = app();
    let (status, body) = send(app.clone(), "POST", "/api/ingest", Some(door_doc())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileName"], "hangar/doors/main_door.txt");
    assert_eq!(body["chunks"], 1);

    let (status, stats) = send(app.clone(), "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalChunks"], 1);
    assert_eq!(stats["bySystem"]["hangar"], 1);

    let (status, answer) = send(app, "POST", "/api/query", Some(json!({ "query": "door width" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["kind"], "found");
    assert_eq!(answer["sources"][0]["fileName"], "hangar/doors/main_door.txt");
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let doc = json!({ "fileName": "blank.txt", "content": "   \n " });
    let (status, body) = send(app(), "POST", "/api/ingest", Some(doc)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "error");
    assert!(body["detail"].as_str().unwrap_or_default().contains("blank.txt"));
}

#[tokio::test]
async fn query_on_empty_index_is_not_an_error() {
    let (status, body) = send(app(), "POST", "/api/query", Some(json!({ "query": "door width" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "empty");
    assert_eq!(body["reason"], "empty_index");
    assert_eq!(body["totalIndexed"], 0);
}

#[tokio::test]
async fn blank_query_is_bad_request() {
    let (status, body) = send(app(), "POST", "/api/query", Some(json!({ "query": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "error");
}

#[tokio::test]
async fn clear_empties_the_index() {
    let app = app();
    send(app.clone(), "POST", "/api/ingest", Some(door_doc())).await;
    let (status, body) = send(app.clone(), "POST", "/api/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);

    let (_, health) = send(app, "GET", "/health", None).await;
    assert_eq!(health["totalChunks"], 0);
}

#[tokio::test]
async fn batch_reports_each_file() {
    let docs = json!([door_doc(), { "fileName": "empty.txt", "content": "" }]);
    let (status, body) = send(app(), "POST", "/api/ingest/batch", Some(docs)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "indexed");
    assert_eq!(body[1]["status"], "rejected");
    assert_eq!(body[1]["fileName"], "empty.txt");
}
