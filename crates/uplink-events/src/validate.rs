//! Event validation — runs before any storage call.
//!
//! Pure functions, no side effects. A rejected event never reaches the
//! storage layer.

use serde_json::Value;

use crate::errors::{EventStoreError, Result};
use crate::types::NewEvent;

/// Maximum accepted `agent_name` length. Generous; the limit exists so a
/// misbehaving reporter cannot store unbounded identifiers.
pub const MAX_AGENT_NAME_LEN: usize = 256;

/// Validate a submitted event.
///
/// Fails with [`EventStoreError::InvalidEvent`] when:
/// - `agent_name` is empty or whitespace-only, or exceeds
///   [`MAX_AGENT_NAME_LEN`] bytes;
/// - `object_data` is present but not a JSON object.
///
/// A missing `event_time` is not an error — the store defaults it to
/// receipt time at submission.
pub fn validate(candidate: &NewEvent) -> Result<()> {
    if candidate.agent_name.trim().is_empty() {
        return Err(EventStoreError::invalid(
            "agent_name",
            "must not be empty or whitespace-only",
        ));
    }
    if candidate.agent_name.len() > MAX_AGENT_NAME_LEN {
        return Err(EventStoreError::invalid(
            "agent_name",
            format!("exceeds {MAX_AGENT_NAME_LEN} bytes"),
        ));
    }
    if let Some(data) = &candidate.object_data {
        validate_object_data(data)?;
    }
    Ok(())
}

/// `object_data` must be a structured key/value document, not a bare
/// scalar or array.
fn validate_object_data(data: &Value) -> Result<()> {
    match data {
        Value::Object(_) => Ok(()),
        other => Err(EventStoreError::invalid(
            "object_data",
            format!("must be a JSON object, got {}", json_type_name(other)),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
