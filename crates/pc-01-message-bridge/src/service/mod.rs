//! Service Layer
//!
//! Orchestrates the channel set and the outbound subscription.

pub mod message_bridge;

pub use message_bridge::{InboundStream, MessageBridge};
