//! Connection pool construction and `SQLite` pragmas.
//!
//! Every connection is initialized with WAL journaling (readers do not
//! block the writer), foreign keys on, and a busy timeout so short write
//! contention resolves inside `SQLite` before the store's own retry loop
//! kicks in.

use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::errors::Result;

/// Shared connection pool handle.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;
/// A connection checked out of the pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Tunables for pool and connection behavior.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long `pool.get()` waits for a free connection before the call
    /// fails with `Timeout`.
    pub acquire_timeout: Duration,
    /// `SQLite` busy handler timeout per statement.
    pub busy_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(2_000),
        }
    }
}

fn init_connection(
    conn: &mut rusqlite::Connection,
    busy_timeout: Duration,
) -> std::result::Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
}

/// Open a file-backed pool at `path`.
pub fn new_pool(path: &Path, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let busy_timeout = config.busy_timeout;
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| init_connection(conn, busy_timeout));
    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.acquire_timeout)
        .build(manager)?;
    info!(path = %path.display(), pool_size = config.pool_size, "opened event store");
    Ok(pool)
}

/// Open an in-memory pool (tests and ephemeral use).
///
/// Capped at one connection: each plain in-memory `SQLite` connection is
/// its own database, so a wider pool would hand out empty databases.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let busy_timeout = config.busy_timeout;
    let manager = SqliteConnectionManager::memory()
        .with_init(move |conn| init_connection(conn, busy_timeout));
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(config.acquire_timeout)
        .build(manager)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_hands_out_connections() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn pragmas_applied() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn file_pool_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        let pool = new_pool(&path, &ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (42);")
                .unwrap();
        }
        let conn = pool.get().unwrap();
        let x: i64 = conn.query_row("SELECT x FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(x, 42);
    }

    #[test]
    fn missing_parent_directory_fails_as_unavailable() {
        let result = new_pool(
            Path::new("/nonexistent-dir/sub/events.db"),
            &ConnectionConfig::default(),
        );
        assert!(result.is_err());
    }
}
