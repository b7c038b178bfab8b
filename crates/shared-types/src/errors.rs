//! # Error Types
//!
//! Defines error types for message construction and decoding.

use thiserror::Error;

/// Errors related to message composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// `compose` was called without any type tag.
    #[error("Must provide at least one message type")]
    EmptyTypeSequence,

    /// A JSON value does not have the `{type, payload}` shape.
    #[error("Malformed message: {0}")]
    Malformed(String),
}
