//! Liveness and metrics endpoints.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /healthz` — runs a trivial query against the store.
///
/// 503 when the database is unreachable, so a load balancer can pull
/// the instance before ingestion starts failing.
#[instrument(skip(state))]
pub async fn healthz(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.store.ping()?;
    Ok(axum::Json(json!({"status": "ok"})))
}

/// `GET /metrics` — Prometheus exposition text.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            crate::metrics::render(handle),
        )
            .into_response(),
        // No recorder installed (e.g. under test).
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
