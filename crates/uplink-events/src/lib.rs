//! # uplink-events
//!
//! Connection-status event model and `SQLite`-backed event store.
//!
//! Reporting agents submit immutable events (`event_time`, `agent_name`,
//! `status_ok`, optional JSON `object_data`); operators read them back
//! filtered by time range, agent, and status, with keyset pagination.
//!
//! Layering, leaves first:
//! - [`types`] — the event model and query surface.
//! - [`validate`] — pure validation, runs before any storage call.
//! - [`sqlite`] — pooling, schema bootstrap, and the event repository.
//! - [`store`] — the [`EventStore`] facade: `submit`, `fetch`,
//!   `query_range`.
//!
//! Events are append-only: no update operation exists anywhere in this
//! crate, and corrections are represented as new events.

pub mod errors;
pub mod sqlite;
pub mod store;
pub mod types;
pub mod validate;

pub use errors::{EventStoreError, Result};
pub use store::{EventIter, EventStore, PageLimits};
pub use types::{ConnectionEvent, EventFilter, EventPage, NewEvent, PageRequest, SortOrder};
pub use validate::validate;
