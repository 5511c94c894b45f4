//! The [`ConnectionEvent`] struct — the core persisted event type.
//!
//! Events are stored as a flat struct with all base fields at the top level
//! and an optional `object_data` payload kept as opaque [`serde_json::Value`].
//! The wire format is camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted connection-status event.
///
/// Immutable once stored: no update path exists anywhere in this crate.
/// Corrections are represented as new events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    /// Storage-assigned id. Strictly increasing but not necessarily
    /// contiguous, and not ordered by `event_time` (agents report late).
    pub id: i64,
    /// When the agent observed the status (RFC 3339, UTC).
    pub event_time: DateTime<Utc>,
    /// The reporting source. Non-empty.
    pub agent_name: String,
    /// Health/connectivity state at `event_time`.
    pub status_ok: bool,
    /// Optional structured payload. Always a JSON object when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_data: Option<Value>,
}

/// An event as submitted by a reporting agent, before the store has
/// assigned an id or defaulted the timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Observation time. Defaulted to receipt time by the store when
    /// absent. Stored at microsecond precision; anything finer is
    /// truncated at submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    /// The reporting source. Must be non-empty after trimming.
    pub agent_name: String,
    /// Health/connectivity state.
    pub status_ok: bool,
    /// Optional structured payload. Must be a JSON object when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_data: Option<Value>,
}
