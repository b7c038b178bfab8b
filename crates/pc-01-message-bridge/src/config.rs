//! Message bridge configuration

use serde::{Deserialize, Serialize};
use shared_bus::{MessageBus, DEFAULT_CHANNEL_CAPACITY};

/// Configuration for a [`crate::MessageBridge`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// `true` for a peer that opens one channel to the host, `false` for the
    /// host that accepts channels from peers.
    pub initiates: bool,
    /// Buffer size of the outbound bus created by [`Self::outbound_bus`].
    pub outbound_capacity: usize,
    /// Name recorded on every log line of this bridge.
    pub name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            initiates: false,
            outbound_capacity: DEFAULT_CHANNEL_CAPACITY,
            name: "bridge".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Host side: listen for channels opened by peers.
    pub fn host() -> Self {
        Self {
            name: "host".to_string(),
            ..Self::default()
        }
    }

    /// Peer side: open a single channel to the host.
    pub fn peer() -> Self {
        Self {
            initiates: true,
            name: "peer".to_string(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }

    /// Create an outbound bus sized for this bridge.
    pub fn outbound_bus(&self) -> MessageBus {
        MessageBus::with_capacity(self.outbound_capacity)
    }
}
