//! Event repository — append and query for the `events` table.
//!
//! Stateless: every method takes `&Connection`. There is deliberately no
//! UPDATE method — stored events are immutable, corrections arrive as new
//! events.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::errors::{EventStoreError, Result};
use crate::types::{ConnectionEvent, EventFilter, SortOrder};

/// A validated event ready for insertion. `event_time` is already
/// defaulted by the caller.
pub struct InsertEvent<'a> {
    /// Observation time (UTC).
    pub event_time: DateTime<Utc>,
    /// Reporting source, non-empty.
    pub agent_name: &'a str,
    /// Health state.
    pub status_ok: bool,
    /// Optional structured payload.
    pub object_data: Option<&'a Value>,
}

/// Exclusive lower (ascending) or upper (descending) bound for keyset
/// pagination: the `(event_time, id)` of the last row already returned.
#[derive(Clone, Copy, Debug)]
pub struct Keyset {
    /// `event_time` of the boundary row.
    pub event_time: DateTime<Utc>,
    /// `id` of the boundary row, tie-breaker.
    pub id: i64,
}

/// Event repository — stateless, every method takes `&Connection`.
pub struct EventRepo;

/// Serialize a timestamp for storage.
///
/// Fixed-width RFC 3339 with microseconds and a `Z` suffix so that
/// lexicographic TEXT comparison in `SQLite` matches chronological order,
/// which the keyset predicates rely on.
pub fn fmt_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl EventRepo {
    /// Insert a validated event, returning the storage-assigned id.
    ///
    /// A single-statement transaction: the row is either fully visible
    /// with its id or not present at all.
    pub fn insert(conn: &Connection, event: &InsertEvent<'_>) -> Result<i64> {
        let object_data = event
            .object_data
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| EventStoreError::Internal(format!("payload serialization: {e}")))?;

        let id = conn
            .query_row(
                "INSERT INTO events (event_time, agent_name, status_ok, object_data)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id",
                params![
                    fmt_time(&event.event_time),
                    event.agent_name,
                    event.status_ok,
                    object_data,
                ],
                |row| row.get(0),
            )
            .map_err(map_constraint)?;
        Ok(id)
    }

    /// Get a single event by id.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<ConnectionEvent>> {
        let row = conn
            .query_row(
                "SELECT id, event_time, agent_name, status_ok, object_data
                 FROM events WHERE id = ?1",
                params![id],
                map_event_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Query events matching `filter`, starting after `keyset`, up to
    /// `limit` rows.
    ///
    /// Ordering is `event_time, id` in the filter's direction; the id
    /// tie-breaker makes pages deterministic when timestamps collide.
    pub fn query(
        conn: &Connection,
        filter: &EventFilter,
        keyset: Option<&Keyset>,
        limit: i64,
    ) -> Result<Vec<ConnectionEvent>> {
        let (sql, param_values) = build_query(filter, keyset, Some(limit));
        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(Box::as_ref).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), map_event_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count events matching `filter` (ignores pagination).
    pub fn count(conn: &Connection, filter: &EventFilter) -> Result<i64> {
        let (where_clause, param_values) = build_where(filter, None, &mut 0);
        let sql = format!("SELECT COUNT(*) FROM events{where_clause}");
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(Box::as_ref).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }
}

type BoxedParams = Vec<Box<dyn rusqlite::types::ToSql>>;

/// Assemble the WHERE clause for `filter` plus an optional keyset bound.
/// `next_param` tracks the 1-based parameter index across call sites.
fn build_where(
    filter: &EventFilter,
    keyset: Option<&Keyset>,
    next_param: &mut usize,
) -> (String, BoxedParams) {
    let mut clauses: Vec<String> = Vec::new();
    let mut param_values: BoxedParams = Vec::new();

    if let Some(agent) = &filter.agent_name {
        *next_param += 1;
        clauses.push(format!("agent_name = ?{next_param}"));
        param_values.push(Box::new(agent.clone()));
    }
    if let Some(ok) = filter.status_ok {
        *next_param += 1;
        clauses.push(format!("status_ok = ?{next_param}"));
        param_values.push(Box::new(ok));
    }
    if let Some(from) = &filter.from {
        *next_param += 1;
        clauses.push(format!("event_time >= ?{next_param}"));
        param_values.push(Box::new(fmt_time(from)));
    }
    if let Some(to) = &filter.to {
        *next_param += 1;
        clauses.push(format!("event_time <= ?{next_param}"));
        param_values.push(Box::new(fmt_time(to)));
    }
    if let Some(key) = keyset {
        let cmp = match filter.order {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        };
        let t = *next_param + 1;
        let i = *next_param + 2;
        clauses.push(format!(
            "(event_time {cmp} ?{t} OR (event_time = ?{t} AND id {cmp} ?{i}))"
        ));
        param_values.push(Box::new(fmt_time(&key.event_time)));
        param_values.push(Box::new(key.id));
        *next_param += 2;
    }

    if clauses.is_empty() {
        (String::new(), param_values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), param_values)
    }
}

fn build_query(
    filter: &EventFilter,
    keyset: Option<&Keyset>,
    limit: Option<i64>,
) -> (String, BoxedParams) {
    let mut next_param = 0;
    let (where_clause, param_values) = build_where(filter, keyset, &mut next_param);
    let direction = match filter.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let mut sql = format!(
        "SELECT id, event_time, agent_name, status_ok, object_data
         FROM events{where_clause}
         ORDER BY event_time {direction}, id {direction}"
    );
    if let Some(limit) = limit {
        use std::fmt::Write;
        let _ = write!(sql, " LIMIT {limit}");
    }
    (sql, param_values)
}

/// Map a SELECTed row to a [`ConnectionEvent`].
///
/// Stored timestamps and payloads were written by this crate; failures to
/// parse them indicate external corruption and surface as conversion
/// errors rather than panics.
fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConnectionEvent> {
    let time_str: String = row.get(1)?;
    let event_time = time_str
        .parse::<DateTime<Utc>>()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
        })?;
    let object_data: Option<String> = row.get(4)?;
    let object_data = object_data
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(ConnectionEvent {
        id: row.get(0)?,
        event_time,
        agent_name: row.get(2)?,
        status_ok: row.get(3)?,
        object_data,
    })
}

/// Surface constraint failures under their own variant; everything else
/// passes through as a plain `SQLite` error.
fn map_constraint(err: rusqlite::Error) -> EventStoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            EventStoreError::ConstraintViolation(
                message.clone().unwrap_or_else(|| code.to_string()),
            )
        }
        _ => EventStoreError::Sqlite(err),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
