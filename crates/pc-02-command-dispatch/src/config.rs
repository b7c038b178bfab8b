//! Dispatch bridge configuration

use serde::{Deserialize, Serialize};
use shared_bus::{MessageBus, DEFAULT_CHANNEL_CAPACITY};

/// Configuration for a [`crate::CommandDispatchBridge`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Register the surface's host event listeners while active. Commands
    /// and the activation snapshot are unaffected.
    pub register_event_listeners: bool,
    /// Buffer size of the command bus created by [`Self::outbound_bus`].
    pub outbound_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            register_event_listeners: true,
            outbound_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl DispatchConfig {
    /// Commands only, no host events.
    pub fn commands_only() -> Self {
        Self {
            register_event_listeners: false,
            ..Self::default()
        }
    }

    /// Create a command bus sized for this bridge.
    pub fn outbound_bus(&self) -> MessageBus {
        MessageBus::with_capacity(self.outbound_capacity)
    }
}
