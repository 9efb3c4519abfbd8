//! Relay error types.

use thiserror::Error;

/// Errors raised when building or sending subscription commands.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Channel params must serialize to a JSON object.
    #[error("subscription params must be a JSON object, got {0}")]
    InvalidParams(&'static str),
    /// Action payloads must be JSON objects.
    #[error("action payload must be a JSON object, got {0}")]
    InvalidPayload(&'static str),
    /// Serialization failed.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// JSON type name, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
