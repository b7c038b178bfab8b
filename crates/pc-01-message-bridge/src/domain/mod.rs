//! Domain Layer - channel bookkeeping
//!
//! This layer contains:
//! - Channel and listener identities
//! - The listener registry used by transports
//! - Signals queued by channel listeners
//! - `ChannelSet`, the live-channel registry
//!
//! RULES:
//! - No I/O operations
//! - No async code; the service layer drives everything by polling

pub mod channel_set;
pub mod ids;
pub mod listeners;
pub mod signal;

pub use channel_set::{BroadcastReport, ChannelSet};
pub use ids::{ChannelId, ListenerId};
pub use listeners::ListenerRegistry;
pub use signal::{BridgeSignal, Observer};
