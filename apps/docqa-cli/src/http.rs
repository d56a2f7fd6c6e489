//! JSON API over `RagService`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use docqa_core::error::Error;
use docqa_core::types::{Document, QueryRequest, QueryResponse};
use docqa_engine::RagService;

/// Core errors rendered as `{ "kind": "error", "detail": ... }`.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::IngestValidation { .. } | Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::IndexState(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "kind": "error", "detail": self.0.to_string() }))).into_response()
    }
}

pub fn router(service: Arc<RagService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ingest", post(ingest))
        .route("/api/ingest/batch", post(ingest_batch))
        .route("/api/replace", post(replace))
        .route("/api/clear", post(clear))
        .route("/api/stats", get(stats))
        .route("/api/query", post(query))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health(State(service): State<Arc<RagService>>) -> impl IntoResponse {
    let total = service.store().len().await;
    Json(json!({ "status": "ok", "totalChunks": total }))
}

async fn ingest(State(service): State<Arc<RagService>>, Json(doc): Json<Document>) -> Result<Response, ApiError> {
    let report = service.ingest(doc).await?;
    Ok(Json(report).into_response())
}

async fn ingest_batch(State(service): State<Arc<RagService>>, Json(docs): Json<Vec<Document>>) -> impl IntoResponse {
    Json(service.ingest_batch(docs).await)
}

async fn replace(State(service): State<Arc<RagService>>, Json(docs): Json<Vec<Document>>) -> impl IntoResponse {
    Json(service.replace_corpus(docs).await)
}

async fn clear(State(service): State<Arc<RagService>>) -> impl IntoResponse {
    let cleared = service.clear().await;
    Json(json!({ "cleared": cleared }))
}

async fn stats(State(service): State<Arc<RagService>>) -> impl IntoResponse {
    Json(service.stats().await)
}

async fn query(State(service): State<Arc<RagService>>, Json(request): Json<QueryRequest>) -> impl IntoResponse {
    let response = service.query(request).await;
    let status = match response {
        QueryResponse::Error { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };
    (status, Json(response))
}
