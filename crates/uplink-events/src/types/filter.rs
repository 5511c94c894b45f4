//! Query filter, paging, and result-page types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::ConnectionEvent;

/// Sort direction for query results.
///
/// Events are always ordered by `event_time` with ties broken by `id` in
/// the same direction, so results are deterministic for equal timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first (the default).
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Filter for event queries. All fields are optional and combine with AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventFilter {
    /// Only events from this agent.
    pub agent_name: Option<String>,
    /// Only events with this status.
    pub status_ok: Option<bool>,
    /// Only events with `event_time >= from`.
    pub from: Option<DateTime<Utc>>,
    /// Only events with `event_time <= to`.
    pub to: Option<DateTime<Utc>>,
    /// Result ordering.
    pub order: SortOrder,
}

/// Page boundary for a query: an optional opaque cursor plus a page size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageRequest {
    /// Opaque cursor from a previous page's `next_cursor`, or `None` for
    /// the first page.
    pub cursor: Option<String>,
    /// Maximum rows to return. `None` means the store's configured default;
    /// values above the configured maximum are clamped.
    pub limit: Option<i64>,
}

/// One page of query results.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    /// The matching events, in filter order.
    pub events: Vec<ConnectionEvent>,
    /// Cursor for the next page, absent when this page exhausted the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl EventFilter {
    /// Filter scoped to a single agent, everything else default.
    pub fn for_agent(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: Some(agent_name.into()),
            ..Self::default()
        }
    }
}
