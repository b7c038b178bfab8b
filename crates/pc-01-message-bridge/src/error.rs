//! Error types for the message bridge

use thiserror::Error;

use crate::domain::ChannelId;

/// Errors reported by a channel transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Channel {0} is disconnected")]
    Disconnected(ChannelId),

    #[error("Channel {channel} rejected message: {reason}")]
    Rejected { channel: ChannelId, reason: String },
}

/// Errors from bridge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The inbound stream is single-consumer; drop the previous one first.
    #[error("Bridge already has an attached inbound stream")]
    AlreadyAttached,
}
