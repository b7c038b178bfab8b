//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - how applications attach to a bridge
//! - Driven Ports (outbound) - the channel transport a bridge runs on

pub mod inbound;
pub mod outbound;

pub use inbound::MessageDriver;
pub use outbound::{Channel, ChannelRuntime, ConnectListener, DisconnectListener, MessageListener};
