//! HTTP error mapping for the event store taxonomy.
//!
//! - `InvalidEvent` → 422 (client data error, includes the violated field)
//! - `Timeout` / `Unavailable` → 503 (caller may retry with backoff)
//! - `ConstraintViolation` and internals → 500, logged at error level
//! - missing resources → 404

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uplink_events::EventStoreError;

/// Errors a handler can surface to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Propagated store error.
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// The requested resource does not exist.
    #[error("not found")]
    NotFound,
}

/// JSON error body: `{error, field?, retryable}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    retryable: bool,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(EventStoreError::InvalidEvent { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(EventStoreError::Unavailable(_) | EventStoreError::Timeout) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Metric label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store(EventStoreError::InvalidEvent { .. }) => "invalid_event",
            Self::Store(EventStoreError::Timeout) => "timeout",
            Self::Store(EventStoreError::Unavailable(_)) => "unavailable",
            Self::Store(EventStoreError::ConstraintViolation(_)) => "constraint_violation",
            Self::Store(_) => "internal",
            Self::NotFound => "not_found",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let (field, retryable) = match &self {
            Self::Store(err) => {
                let field = match err {
                    EventStoreError::InvalidEvent { field, .. } => Some(*field),
                    _ => None,
                };
                (field, err.is_retryable())
            }
            Self::NotFound => (None, false),
        };
        let body = ErrorBody {
            error: self.to_string(),
            field,
            retryable,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_event_maps_to_422() {
        let err = ApiError::Store(EventStoreError::invalid("agent_name", "empty"));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "invalid_event");
    }

    #[test]
    fn transient_errors_map_to_503() {
        assert_eq!(
            ApiError::Store(EventStoreError::Timeout).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Store(EventStoreError::Unavailable("pool".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn constraint_violation_maps_to_500() {
        assert_eq!(
            ApiError::Store(EventStoreError::ConstraintViolation("unique".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
