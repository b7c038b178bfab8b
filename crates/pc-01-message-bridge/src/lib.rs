//! # PC-01 Message Bridge
//!
//! Multiplexes one outbound message stream onto a dynamic set of duplex
//! channels and merges everything those channels receive into one inbound
//! stream.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): bookkeeping, no I/O
//!   - `ChannelSet`: live channels and the outbound subscription
//!   - `Observer` / `BridgeSignal`: the queue channel listeners feed
//!   - `ListenerRegistry`: callback registry for transports
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `MessageDriver`: Driving port (attach an outbound source)
//!   - `Channel`, `ChannelRuntime`: Driven ports (the transport)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `MessageBridge`: hands out the inbound stream
//!   - `InboundStream`: activates on first poll, tears down on drop
//!
//! - **Adapters Layer** (`adapters/`): Transports
//!   - `MemoryRuntime`: linked in-process channel pairs
//!
//! ## Invariants
//!
//! - A channel is added at most once while live; its listeners are
//!   registered once and deregistered on removal.
//! - The outbound subscription is held iff at least one channel is live.
//! - One failing channel never stops a broadcast to the others.
//! - Dropping the inbound stream closes every channel and releases every
//!   listener it registered.
//!
//! ## Usage Example
//!
//! ```ignore
//! use futures::StreamExt;
//! use pc_01_message_bridge::{BridgeConfig, MemoryRuntime, MessageBridge};
//! use shared_bus::MessageBus;
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(MemoryRuntime::new());
//! let config = BridgeConfig::host();
//! let outbound = Arc::new(config.outbound_bus());
//!
//! let bridge = MessageBridge::new(config, runtime);
//! let mut inbound = bridge.attach(outbound.clone())?;
//!
//! while let Some(message) = inbound.next().await {
//!     if message.is("ping") {
//!         outbound.send(Message::new("pong", message.into_payload()));
//!     }
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{MemoryChannel, MemoryRuntime};
pub use config::BridgeConfig;
pub use domain::{BroadcastReport, ChannelId, ChannelSet, ListenerId, ListenerRegistry};
pub use error::{BridgeError, ChannelError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    Channel, ChannelRuntime, ConnectListener, DisconnectListener, MessageDriver, MessageListener,
};
pub use service::{InboundStream, MessageBridge};
