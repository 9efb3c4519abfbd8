//! Outbound command envelope.

use serde::{Deserialize, Serialize};

/// Command name for channel messages.
pub const MESSAGE_COMMAND: &str = "message";

/// Envelope handed to the consumer for every outbound channel message.
///
/// `data` is the JSON-encoded payload as a string, not a nested object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name, always `"message"` for channel traffic.
    pub command: String,
    /// Channel identifier (JSON-encoded subscription params).
    pub identifier: String,
    /// JSON-encoded payload.
    pub data: String,
}

impl Command {
    /// Build a `"message"` command.
    pub fn message(identifier: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            command: MESSAGE_COMMAND.to_owned(),
            identifier: identifier.into(),
            data: data.into(),
        }
    }
}
