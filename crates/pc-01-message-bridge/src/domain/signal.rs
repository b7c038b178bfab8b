//! Signals raised by channel listeners.
//!
//! Listeners never touch bridge state. They push a [`BridgeSignal`] through
//! the [`Observer`] and the active bridge applies it on its next poll, so all
//! membership changes happen in one place and in arrival order.

use shared_types::Message;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::ids::ChannelId;
use crate::ports::Channel;

/// Something that happened on the channel side of the bridge.
pub enum BridgeSignal {
    /// A peer opened a channel.
    Accepted(Arc<dyn Channel>),
    /// A message arrived on a live channel.
    Inbound { channel: ChannelId, message: Message },
    /// A channel closed.
    Disconnected(ChannelId),
}

impl fmt::Debug for BridgeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted(channel) => f.debug_tuple("Accepted").field(&channel.id()).finish(),
            Self::Inbound { channel, message } => f
                .debug_struct("Inbound")
                .field("channel", channel)
                .field("message", message)
                .finish(),
            Self::Disconnected(channel) => f.debug_tuple("Disconnected").field(channel).finish(),
        }
    }
}

/// Sending half of the active bridge's signal queue.
///
/// Cloned into every listener the bridge registers. Once the bridge has been
/// deactivated the queue is gone and signals are discarded.
#[derive(Clone)]
pub struct Observer {
    sender: mpsc::UnboundedSender<BridgeSignal>,
}

impl Observer {
    /// Create an observer and the queue it feeds.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BridgeSignal>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Forward an inbound message.
    pub fn next(&self, channel: ChannelId, message: Message) {
        let _ = self.sender.send(BridgeSignal::Inbound { channel, message });
    }

    /// Report a newly accepted channel.
    pub fn accepted(&self, channel: Arc<dyn Channel>) {
        let _ = self.sender.send(BridgeSignal::Accepted(channel));
    }

    /// Report a closed channel.
    pub fn disconnected(&self, channel: ChannelId) {
        let _ = self.sender.send(BridgeSignal::Disconnected(channel));
    }
}
