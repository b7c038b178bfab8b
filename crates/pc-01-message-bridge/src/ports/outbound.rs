//! Outbound Ports (Driven Ports)
//!
//! The channel primitives the bridge depends on. Transports implement these;
//! the bridge never creates a channel itself.

use shared_types::Message;
use std::sync::Arc;

use crate::domain::{ChannelId, ListenerId};
use crate::error::ChannelError;

/// Callback for messages arriving on a channel.
pub type MessageListener = Arc<dyn Fn(Message) + Send + Sync>;

/// Callback for a channel closing. Receives the id of the closed end.
pub type DisconnectListener = Arc<dyn Fn(ChannelId) + Send + Sync>;

/// Callback for a channel opened by a peer.
pub type ConnectListener = Arc<dyn Fn(Arc<dyn Channel>) + Send + Sync>;

/// A duplex, message-oriented channel endpoint (Driven Port).
///
/// Listeners may be invoked from any thread and must not block.
pub trait Channel: Send + Sync {
    /// Identity of this endpoint.
    fn id(&self) -> ChannelId;

    /// Send a message to the other end.
    ///
    /// Fire-and-forget: `Ok` means the transport accepted the message, not
    /// that the peer processed it.
    fn post(&self, message: &Message) -> Result<(), ChannelError>;

    /// Register a listener for inbound messages. Messages are delivered in
    /// the order they were received.
    fn add_message_listener(&self, listener: MessageListener) -> ListenerId;

    /// Deregister an inbound-message listener.
    fn remove_message_listener(&self, id: ListenerId) -> bool;

    /// Register a listener for the channel closing.
    fn add_disconnect_listener(&self, listener: DisconnectListener) -> ListenerId;

    /// Deregister a disconnect listener.
    fn remove_disconnect_listener(&self, id: ListenerId) -> bool;

    /// Close the channel.
    ///
    /// Disconnect listeners on both ends are notified exactly once, whichever
    /// end closes first. Closing twice is a no-op.
    fn disconnect(&self);
}

/// Creates and accepts channels (Driven Port).
pub trait ChannelRuntime: Send + Sync {
    /// Open a channel to the host. Always yields a handle; transport failure
    /// surfaces later as a disconnect.
    fn connect(&self) -> Arc<dyn Channel>;

    /// Be notified of every channel a peer opens from now on.
    fn add_connect_listener(&self, listener: ConnectListener) -> ListenerId;

    /// Stop being notified of new channels.
    fn remove_connect_listener(&self, id: ListenerId) -> bool;
}
