//! In-memory channel transport.
//!
//! A [`MemoryRuntime`] plays the role of the process boundary: `connect`
//! creates a linked pair of [`MemoryChannel`] endpoints, keeps one for the
//! caller and announces the other to every connect listener. Delivery is
//! synchronous; posting on one end runs the other end's message listeners
//! before `post` returns.

use shared_types::Message;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::domain::{ChannelId, ListenerId, ListenerRegistry};
use crate::error::ChannelError;
use crate::ports::{Channel, ChannelRuntime, ConnectListener, DisconnectListener, MessageListener};

struct Endpoint {
    id: ChannelId,
    message_listeners: ListenerRegistry<dyn Fn(Message) + Send + Sync>,
    disconnect_listeners: ListenerRegistry<dyn Fn(ChannelId) + Send + Sync>,
}

impl Endpoint {
    fn new() -> Self {
        Self {
            id: ChannelId::next(),
            message_listeners: ListenerRegistry::new(),
            disconnect_listeners: ListenerRegistry::new(),
        }
    }

    fn notify_disconnect(&self) {
        for listener in self.disconnect_listeners.snapshot() {
            listener(self.id);
        }
    }
}

/// State shared by both ends of a channel.
struct Link {
    open: AtomicBool,
    ends: [Endpoint; 2],
}

/// One end of an in-memory duplex channel.
pub struct MemoryChannel {
    link: Arc<Link>,
    side: usize,
}

impl MemoryChannel {
    /// Create two linked endpoints.
    pub fn pair() -> (Arc<Self>, Arc<Self>) {
        let link = Arc::new(Link {
            open: AtomicBool::new(true),
            ends: [Endpoint::new(), Endpoint::new()],
        });
        let near = Arc::new(Self {
            link: Arc::clone(&link),
            side: 0,
        });
        let far = Arc::new(Self { link, side: 1 });
        (near, far)
    }

    /// Id of the other end.
    pub fn partner_id(&self) -> ChannelId {
        self.partner().id
    }

    /// Whether neither end has disconnected yet.
    pub fn is_open(&self) -> bool {
        self.link.open.load(Ordering::Acquire)
    }

    fn local(&self) -> &Endpoint {
        &self.link.ends[self.side]
    }

    fn partner(&self) -> &Endpoint {
        &self.link.ends[1 - self.side]
    }
}

impl Channel for MemoryChannel {
    fn id(&self) -> ChannelId {
        self.local().id
    }

    fn post(&self, message: &Message) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Disconnected(self.id()));
        }
        trace!(
            from = %self.id(),
            to = %self.partner_id(),
            message_type = message.message_type(),
            "Delivering message"
        );
        for listener in self.partner().message_listeners.snapshot() {
            listener(message.clone());
        }
        Ok(())
    }

    fn add_message_listener(&self, listener: MessageListener) -> ListenerId {
        self.local().message_listeners.add(listener)
    }

    fn remove_message_listener(&self, id: ListenerId) -> bool {
        self.local().message_listeners.remove(id)
    }

    fn add_disconnect_listener(&self, listener: DisconnectListener) -> ListenerId {
        self.local().disconnect_listeners.add(listener)
    }

    fn remove_disconnect_listener(&self, id: ListenerId) -> bool {
        self.local().disconnect_listeners.remove(id)
    }

    fn disconnect(&self) {
        if !self.link.open.swap(false, Ordering::AcqRel) {
            return;
        }
        debug!(channel = %self.id(), partner = %self.partner_id(), "Channel closed");
        self.local().notify_disconnect();
        self.partner().notify_disconnect();
    }
}

/// In-process [`ChannelRuntime`].
#[derive(Default)]
pub struct MemoryRuntime {
    connect_listeners: ListenerRegistry<dyn Fn(Arc<dyn Channel>) + Send + Sync>,
    channels_opened: AtomicU64,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels opened through `connect` so far.
    pub fn channels_opened(&self) -> u64 {
        self.channels_opened.load(Ordering::Relaxed)
    }

    /// Registered connect listeners.
    pub fn connect_listener_count(&self) -> usize {
        self.connect_listeners.len()
    }
}

impl ChannelRuntime for MemoryRuntime {
    fn connect(&self) -> Arc<dyn Channel> {
        let (near, far) = MemoryChannel::pair();
        self.channels_opened.fetch_add(1, Ordering::Relaxed);

        let listeners = self.connect_listeners.snapshot();
        debug!(
            channel = %near.id(),
            partner = %far.id(),
            listeners = listeners.len(),
            "Channel opened"
        );

        let far: Arc<dyn Channel> = far;
        for listener in listeners {
            listener(Arc::clone(&far));
        }
        near
    }

    fn add_connect_listener(&self, listener: ConnectListener) -> ListenerId {
        self.connect_listeners.add(listener)
    }

    fn remove_connect_listener(&self, id: ListenerId) -> bool {
        self.connect_listeners.remove(id)
    }
}
