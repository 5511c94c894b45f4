//! Router assembly.

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{events, health};
use crate::state::AppState;

/// Build the full service router.
///
/// Layers apply outermost-first: tracing wraps the timeout, which wraps
/// the body limit, which wraps the handlers.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_millis(state.settings.server.request_timeout_ms);
    let max_body = state.settings.server.max_body_bytes;

    Router::new()
        .route("/v1/events", post(events::submit).get(events::list))
        .route("/v1/events/count", get(events::count))
        .route("/v1/events/{id}", get(events::get_by_id))
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(health::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(RequestBodyLimitLayer::new(max_body))
        .with_state(state)
}
