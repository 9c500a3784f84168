use crate::api::{dispatch, AppState, Envelope, Operation};
use crate::error::{AppError, Result};
use crate::metrics::gather_metrics;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, Uri},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.context.started_at,
        uptime_seconds: state.context.uptime_seconds(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
}

/// Prometheus scrape endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Bulk-index the configured product catalog
pub async fn index_products(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::Index, &body).await
}

/// Bulk-index documents supplied in the request body
pub async fn index_custom_documents(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::IndexCustomDocument, &body).await
}

/// Delete the keyword index
pub async fn delete_index(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::DeleteIndex, &body).await
}

/// Issue a presigned image upload URL
pub async fn presigned_url(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::PresignedUrl, &body).await
}

/// Embed the catalog into both vector indices
pub async fn vectorize_index(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::VectorizeIndex, &body).await
}

/// Delete both vector indices
pub async fn delete_vectorize_index(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::DeleteVectorizeIndex, &body).await
}

/// Run a search request
pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Envelope> {
    run(&state, Operation::Search, &body).await
}

/// Anything without a registered operation
pub async fn unsupported(method: Method, uri: Uri) -> AppError {
    AppError::UnsupportedOperation(format!("{}{}", method, uri.path()))
}

async fn run(state: &AppState, operation: Operation, body: &[u8]) -> Result<Envelope> {
    let body = parse_body(body)?;
    dispatch(&state.context, operation, body).await
}

/// Empty bodies are treated as `null`
fn parse_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|_| AppError::Validation("Invalid request, body should be valid JSON".into()))
}
