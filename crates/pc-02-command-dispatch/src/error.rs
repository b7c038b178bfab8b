//! Error types for command dispatch

use thiserror::Error;

/// Errors from decoding commands and attaching the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Command '{command}' is missing argument {index}")]
    MissingArgument { command: &'static str, index: usize },

    #[error("Command '{command}' argument {index} is invalid: {reason}")]
    InvalidArgument {
        command: &'static str,
        index: usize,
        reason: String,
    },

    /// The inbound stream is single-consumer; drop the previous one first.
    #[error("Dispatch bridge already has an attached inbound stream")]
    AlreadyAttached,
}

/// Errors reported by the host API behind a command surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Host rejected the call: {0}")]
    Rejected(String),

    #[error("Host API unavailable: {0}")]
    Unavailable(String),

    #[error("Host returned a malformed record: {0}")]
    Malformed(String),
}

impl HostError {
    pub fn window_not_found(id: i64) -> Self {
        Self::NotFound { kind: "window", id }
    }

    pub fn tab_not_found(id: i64) -> Self {
        Self::NotFound { kind: "tab", id }
    }
}
