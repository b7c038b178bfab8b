//! # Message Envelope
//!
//! A `Message` is a routing tag plus an opaque JSON payload. Tags may be
//! hierarchical: `compose(&["windows", "create"], args)` nests the payload
//! under one `{type, payload}` wrapper per tag, outermost tag first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::MessageError;

/// Routing tag carried by every message.
pub type MessageType = String;

/// A tagged message exchanged between host and peers.
///
/// Immutable once constructed. The payload is never inspected by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    message_type: MessageType,
    #[serde(default)]
    payload: Value,
}

impl Message {
    /// Create a flat message.
    pub fn new(message_type: impl Into<MessageType>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
        }
    }

    /// The routing tag.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// The opaque payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Whether this message carries the given tag.
    pub fn is(&self, message_type: &str) -> bool {
        self.message_type == message_type
    }

    /// Consume the message, keeping only the payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Split into tag and payload.
    pub fn into_parts(self) -> (MessageType, Value) {
        (self.message_type, self.payload)
    }

    /// Render as a `{"type": .., "payload": ..}` JSON object.
    pub fn into_value(self) -> Value {
        let mut object = Map::with_capacity(2);
        object.insert("type".to_string(), Value::String(self.message_type));
        object.insert("payload".to_string(), self.payload);
        Value::Object(object)
    }

    /// Parse a `{"type": .., "payload": ..}` JSON object.
    ///
    /// A missing payload decodes as `null`.
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        serde_json::from_value(value).map_err(|e| MessageError::Malformed(e.to_string()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.message_type, self.payload)
    }
}

/// Build a message from an ordered, non-empty sequence of type tags.
///
/// A single tag yields a flat message. With several tags the payload is
/// nested so that the first tag is the outermost wrapper.
///
/// # Errors
///
/// Returns [`MessageError::EmptyTypeSequence`] when `types` is empty.
pub fn compose<S: AsRef<str>>(types: &[S], payload: Value) -> Result<Message, MessageError> {
    let (innermost, outer) = types
        .split_last()
        .ok_or(MessageError::EmptyTypeSequence)?;

    let mut message = Message::new(innermost.as_ref(), payload);
    for tag in outer.iter().rev() {
        message = Message::new(tag.as_ref(), message.into_value());
    }
    Ok(message)
}
