//! Schema bootstrap, gated on `PRAGMA user_version`.
//!
//! Migrations are append-only: each entry runs once, in order, inside a
//! transaction that also bumps `user_version`. Running against an
//! up-to-date database is a no-op.

use rusqlite::Connection;
use tracing::info;

use crate::errors::Result;

/// Ordered migration scripts. Index + 1 == resulting `user_version`.
const MIGRATIONS: &[&str] = &[
    // v1: the events table and its query indexes.
    //
    // `id` is INTEGER PRIMARY KEY AUTOINCREMENT: the explicit sequence the
    // storage layer owns. AUTOINCREMENT forbids rowid reuse so ids stay
    // strictly increasing even across deletes by an external retention job.
    "CREATE TABLE events (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        event_time  TEXT NOT NULL,
        agent_name  TEXT NOT NULL CHECK (length(agent_name) > 0),
        status_ok   INTEGER NOT NULL CHECK (status_ok IN (0, 1)),
        object_data TEXT
     );
     CREATE INDEX idx_events_time ON events (event_time, id);
     CREATE INDEX idx_events_agent_time ON events (agent_name, event_time);",
];

/// Apply any pending migrations. Idempotent.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (i, script) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i64;
        if version <= current {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(script)?;
        // PRAGMA does not support parameters.
        tx.execute_batch(&format!("PRAGMA user_version = {version}"))?;
        tx.commit()?;
        info!(version, "applied event store migration");
    }
    Ok(())
}
