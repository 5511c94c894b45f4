//! # uplink-server
//!
//! Axum HTTP surface for the event store.
//!
//! Endpoints:
//! - `POST /v1/events` — submit one event, returns `201 {"id": N}`
//! - `GET /v1/events` — filtered, paginated listing
//! - `GET /v1/events/count` — count matching events
//! - `GET /v1/events/{id}` — fetch one event
//! - `GET /healthz` — liveness (checks the database)
//! - `GET /metrics` — Prometheus exposition
//!
//! The binary crate builds [`AppState`], calls [`build_router`], and
//! drives `axum::serve` with graceful shutdown.

pub mod error;
pub mod metrics;
pub mod router;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
