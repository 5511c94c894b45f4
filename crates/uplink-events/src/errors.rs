//! Error taxonomy for the event store.
//!
//! Three caller-facing categories:
//! - [`EventStoreError::InvalidEvent`] — client data error, never retried.
//! - [`EventStoreError::Unavailable`] / [`EventStoreError::Timeout`] —
//!   transient infrastructure failure, retryable by the caller with backoff.
//! - [`EventStoreError::ConstraintViolation`] — a storage-level invariant
//!   fired, treated as a server error.
//!
//! The store itself never retries anything except `SQLITE_BUSY`/`LOCKED`
//! (which happen before a write commits), so a surfaced error always means
//! zero rows were persisted by the failed call.

use thiserror::Error;

/// Errors surfaced by the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The submitted event failed validation. `field` names the offending
    /// field; `reason` is a human-readable explanation.
    #[error("invalid event: {field}: {reason}")]
    InvalidEvent {
        /// The field that failed validation.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    /// The underlying store could not be reached (pool exhausted, file
    /// missing, connection refused).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A storage call exceeded its deadline. No partial write is visible.
    #[error("storage timeout")]
    Timeout,

    /// A uniqueness or not-null constraint fired at the storage level.
    /// Should not occur when validation ran first.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Underlying `SQLite` error not covered by a more specific variant.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Internal invariant failure (lock poisoning, corrupt row).
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventStoreError {
    /// Whether the caller may retry the failed call with backoff.
    ///
    /// True only for transient infrastructure failures. Validation and
    /// constraint errors are deterministic and retrying them is futile.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }

    /// Shorthand for an [`InvalidEvent`](Self::InvalidEvent).
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            field,
            reason: reason.into(),
        }
    }
}

impl From<r2d2::Error> for EventStoreError {
    fn from(err: r2d2::Error) -> Self {
        // r2d2 reports pool acquire timeouts through the same opaque error
        // type; the message is the only discriminator it exposes.
        if err.to_string().contains("timed out") {
            Self::Timeout
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EventStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(EventStoreError::Unavailable("pool".into()).is_retryable());
        assert!(EventStoreError::Timeout.is_retryable());
        assert!(!EventStoreError::invalid("agent_name", "empty").is_retryable());
        assert!(!EventStoreError::ConstraintViolation("unique".into()).is_retryable());
        assert!(!EventStoreError::Internal("oops".into()).is_retryable());
    }

    #[test]
    fn invalid_event_names_field() {
        let err = EventStoreError::invalid("agent_name", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid event: agent_name: must not be empty"
        );
    }
}
