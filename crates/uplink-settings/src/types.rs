//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so partial JSON files work — missing fields get their production default
//! during deserialization.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Root settings for the Uplink event store.
///
/// Loaded from a JSON file with defaults applied for missing fields, then
/// overridden by `UPLINK_*` environment variables. Example file:
///
/// ```json
/// {
///   "server": { "bind": "0.0.0.0:7600" },
///   "query": { "maxPageSize": 500 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UplinkSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Storage backend settings.
    pub storage: StorageSettings,
    /// Query paging bounds.
    pub query: QuerySettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for UplinkSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "uplink".to_string(),
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            query: QuerySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl UplinkSettings {
    /// Correct invalid values in place rather than rejecting the file.
    ///
    /// Called automatically during loading. Out-of-range values are
    /// clamped with a warning so a typo in one field does not take the
    /// whole service down.
    pub fn normalize(&mut self) {
        if self.query.default_page_size <= 0 {
            warn!(
                value = self.query.default_page_size,
                "defaultPageSize must be positive, resetting to 100"
            );
            self.query.default_page_size = 100;
        }
        if self.query.max_page_size < self.query.default_page_size {
            warn!(
                max = self.query.max_page_size,
                default = self.query.default_page_size,
                "maxPageSize below defaultPageSize, raising to match"
            );
            self.query.max_page_size = self.query.default_page_size;
        }
        if self.storage.pool_size == 0 {
            warn!("poolSize must be at least 1, resetting to 1");
            self.storage.pool_size = 1;
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Socket address the server binds to.
    pub bind: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7600".to_string(),
            request_timeout_ms: 10_000,
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Storage backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Path to the `SQLite` database file.
    pub db_path: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long to wait for a pooled connection before failing the call.
    pub acquire_timeout_ms: u64,
    /// `SQLite` busy handler timeout per statement.
    pub busy_timeout_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: "uplink.db".to_string(),
            pool_size: 8,
            acquire_timeout_ms: 5_000,
            busy_timeout_ms: 2_000,
        }
    }
}

/// Query paging bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySettings {
    /// Page size when the caller supplies none.
    pub default_page_size: i64,
    /// Hard cap on requested page sizes.
    pub max_page_size: i64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 1_000,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default tracing filter directive (overridable via `UPLINK_LOG`).
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
