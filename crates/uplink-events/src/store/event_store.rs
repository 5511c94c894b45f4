//! High-level [`EventStore`] API.
//!
//! Composes validation, the connection pool, and the event repository into
//! the two operations the rest of the system uses: `submit` (ingestion)
//! and `fetch`/`query_range` (querying). Every write is a single-statement
//! transaction — callers never observe partial state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::errors::{EventStoreError, Result};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::event::{EventRepo, InsertEvent, Keyset};
use crate::store::cursor;
use crate::store::iter::EventIter;
use crate::types::{ConnectionEvent, EventFilter, EventPage, NewEvent, PageRequest};
use crate::validate::validate;

/// Page size bounds enforced by [`EventStore::fetch`].
#[derive(Clone, Copy, Debug)]
pub struct PageLimits {
    /// Page size used when the caller supplies none.
    pub default_page_size: i64,
    /// Hard cap; larger requested limits are clamped, not rejected.
    pub max_page_size: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 1_000,
        }
    }
}

/// Append-only store for connection-status events.
///
/// No per-event locking: events are independent and immutable, so write
/// serialization is left entirely to `SQLite`. The only in-process retry
/// is for `SQLITE_BUSY`/`LOCKED`, which fires before a write commits.
pub struct EventStore {
    pool: ConnectionPool,
    limits: PageLimits,
}

impl EventStore {
    const BUSY_MAX_RETRIES: u32 = 32;

    /// Create a store over an existing pool with default page limits.
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            limits: PageLimits::default(),
        }
    }

    /// Override page size bounds (wired from settings by the server).
    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ingestion
    // ─────────────────────────────────────────────────────────────────────

    /// Validate and persist a submitted event, returning the assigned id.
    ///
    /// `event_time` defaults to receipt time when absent and is truncated
    /// to microsecond precision (the resolution storage keeps), so a
    /// later fetch returns exactly the persisted value. Exactly one row
    /// is stored on success and none on failure. Transient storage errors
    /// are surfaced to the caller for retry with backoff — the store never
    /// retries a failed commit itself, which could duplicate the row.
    #[instrument(skip(self, event), fields(agent_name = %event.agent_name, status_ok = event.status_ok))]
    pub fn submit(&self, event: &NewEvent) -> Result<i64> {
        validate(event)?;
        let event_time = truncate_to_micros(event.event_time.unwrap_or_else(Utc::now));
        let record = InsertEvent {
            event_time,
            agent_name: &event.agent_name,
            status_ok: event.status_ok,
            object_data: event.object_data.as_ref(),
        };
        let id = self.append(&record)?;
        debug!(id, "event stored");
        Ok(id)
    }

    /// Persist an already-validated record, returning the assigned id.
    ///
    /// The single mutation path in the crate. Retries only on
    /// `SQLITE_BUSY`/`LOCKED`, which occur before the insert commits.
    pub fn append(&self, record: &InsertEvent<'_>) -> Result<i64> {
        Self::retry_on_sqlite_busy(|| {
            let conn = self.conn()?;
            EventRepo::insert(&conn, record)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Querying
    // ─────────────────────────────────────────────────────────────────────

    /// Get a single event by id.
    pub fn get(&self, id: i64) -> Result<Option<ConnectionEvent>> {
        let conn = self.conn()?;
        EventRepo::get_by_id(&conn, id)
    }

    /// Fetch one bounded page of events matching `filter`.
    ///
    /// The limit is clamped to the configured maximum. `next_cursor` is
    /// present exactly when more rows match beyond this page; feeding it
    /// back resumes after the last returned row with no duplicates or
    /// omissions, even when timestamps collide.
    pub fn fetch(&self, filter: &EventFilter, page: &PageRequest) -> Result<EventPage> {
        let limit = self.clamp_limit(page.limit)?;
        let keyset = page
            .cursor
            .as_deref()
            .map(|c| cursor::decode(c, filter.order))
            .transpose()?;

        let conn = self.conn()?;
        // One extra row decides whether a next page exists.
        let mut events = EventRepo::query(&conn, filter, keyset.as_ref(), limit + 1)?;

        let next_cursor = if events.len() as i64 > limit {
            events.truncate(limit as usize);
            let last = events
                .last()
                .ok_or_else(|| EventStoreError::Internal("non-empty page lost its rows".into()))?;
            Some(cursor::encode(
                &Keyset {
                    event_time: last.event_time,
                    id: last.id,
                },
                filter.order,
            ))
        } else {
            None
        };

        Ok(EventPage {
            events,
            next_cursor,
        })
    }

    /// Lazily iterate all events matching `filter`.
    ///
    /// The iterator pages through [`fetch`](Self::fetch) under the hood,
    /// so it is finite and bounded in memory. Constructing a fresh
    /// iterator restarts from the beginning.
    pub fn query_range(&self, filter: &EventFilter) -> EventIter<'_> {
        EventIter::new(self, filter.clone(), self.limits.default_page_size)
    }

    /// Count events matching `filter`.
    pub fn count(&self, filter: &EventFilter) -> Result<i64> {
        let conn = self.conn()?;
        EventRepo::count(&conn, filter)
    }

    /// Cheap liveness probe for health endpoints.
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        let _: i64 = conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(EventStoreError::Sqlite)?;
        Ok(())
    }

    fn clamp_limit(&self, requested: Option<i64>) -> Result<i64> {
        match requested {
            None => Ok(self.limits.default_page_size),
            Some(n) if n <= 0 => Err(EventStoreError::invalid("limit", "must be positive")),
            Some(n) => Ok(n.min(self.limits.max_page_size)),
        }
    }

    /// Retry an operation on `SQLite` BUSY/LOCKED with linear backoff and
    /// jitter to avoid thundering herd between contending writers.
    fn retry_on_sqlite_busy<T>(mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts = 0;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err)
                    if Self::is_sqlite_busy_or_locked(&err)
                        && attempts < Self::BUSY_MAX_RETRIES =>
                {
                    attempts += 1;
                    let base_ms = u64::from(attempts).saturating_mul(10).min(500);
                    let jitter_range = base_ms / 4;
                    let jitter = if jitter_range > 0 {
                        rand::random::<u64>() % (jitter_range * 2 + 1)
                    } else {
                        0
                    };
                    let backoff_ms = base_ms.saturating_sub(jitter_range) + jitter;
                    warn!(attempts, backoff_ms, "sqlite busy, backing off");
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_sqlite_busy_or_locked(err: &EventStoreError) -> bool {
        match err {
            EventStoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => {
                matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
            }
            _ => false,
        }
    }
}

/// Drop sub-microsecond precision so the submitted value equals what a
/// later fetch reads back from storage.
fn truncate_to_micros(time: DateTime<Utc>) -> DateTime<Utc> {
    let excess = i64::from(time.timestamp_subsec_nanos() % 1_000);
    time - chrono::Duration::nanoseconds(excess)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
