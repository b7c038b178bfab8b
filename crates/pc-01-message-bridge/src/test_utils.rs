//! Test doubles for the channel ports.
//!
//! `RecordingChannel` records every send and listener registration so tests
//! can assert exact bookkeeping. `StubRuntime` hands out recording channels
//! and lets a test play the part of a connecting peer.

use parking_lot::Mutex;
use shared_types::Message;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::{ChannelId, ListenerId, ListenerRegistry};
use crate::error::ChannelError;
use crate::ports::{Channel, ChannelRuntime, ConnectListener, DisconnectListener, MessageListener};

/// Channel double that records what the bridge does to it.
pub struct RecordingChannel {
    id: ChannelId,
    fail_sends: bool,
    notify_on_disconnect: bool,
    sent: Mutex<Vec<Message>>,
    send_attempts: AtomicUsize,
    disconnect_calls: AtomicUsize,
    disconnected: AtomicBool,
    message_listeners: ListenerRegistry<dyn Fn(Message) + Send + Sync>,
    disconnect_listeners: ListenerRegistry<dyn Fn(ChannelId) + Send + Sync>,
    message_registrations: AtomicUsize,
    disconnect_registrations: AtomicUsize,
}

impl RecordingChannel {
    fn build(fail_sends: bool, notify_on_disconnect: bool) -> Arc<Self> {
        Arc::new(Self {
            id: ChannelId::next(),
            fail_sends,
            notify_on_disconnect,
            sent: Mutex::new(Vec::new()),
            send_attempts: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            disconnected: AtomicBool::new(false),
            message_listeners: ListenerRegistry::new(),
            disconnect_listeners: ListenerRegistry::new(),
            message_registrations: AtomicUsize::new(0),
            disconnect_registrations: AtomicUsize::new(0),
        })
    }

    /// A well-behaved channel.
    pub fn new() -> Arc<Self> {
        Self::build(false, true)
    }

    /// A channel whose every send fails.
    pub fn failing() -> Arc<Self> {
        Self::build(true, true)
    }

    /// A channel that never reports its own disconnect.
    pub fn silent() -> Arc<Self> {
        Self::build(false, false)
    }

    /// Deliver `message` as if the peer had sent it.
    pub fn emit(&self, message: Message) {
        for listener in self.message_listeners.snapshot() {
            listener(message.clone());
        }
    }

    /// Close the channel from the peer's side.
    pub fn close_remote(&self) {
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return;
        }
        self.notify_disconnect();
    }

    /// Messages successfully sent, in order.
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    /// Sends attempted, including failed ones.
    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::Relaxed)
    }

    /// How many times `disconnect` was called.
    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::Relaxed)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Message listeners currently registered.
    pub fn message_listener_count(&self) -> usize {
        self.message_listeners.len()
    }

    /// Disconnect listeners currently registered.
    pub fn disconnect_listener_count(&self) -> usize {
        self.disconnect_listeners.len()
    }

    /// Message listeners ever registered.
    pub fn message_registrations(&self) -> usize {
        self.message_registrations.load(Ordering::Relaxed)
    }

    /// Disconnect listeners ever registered.
    pub fn disconnect_registrations(&self) -> usize {
        self.disconnect_registrations.load(Ordering::Relaxed)
    }

    fn notify_disconnect(&self) {
        for listener in self.disconnect_listeners.snapshot() {
            listener(self.id);
        }
    }
}

impl Channel for RecordingChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn post(&self, message: &Message) -> Result<(), ChannelError> {
        self.send_attempts.fetch_add(1, Ordering::Relaxed);
        if self.is_disconnected() {
            return Err(ChannelError::Disconnected(self.id));
        }
        if self.fail_sends {
            return Err(ChannelError::Rejected {
                channel: self.id,
                reason: "send failure injected".to_string(),
            });
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }

    fn add_message_listener(&self, listener: MessageListener) -> ListenerId {
        self.message_registrations.fetch_add(1, Ordering::Relaxed);
        self.message_listeners.add(listener)
    }

    fn remove_message_listener(&self, id: ListenerId) -> bool {
        self.message_listeners.remove(id)
    }

    fn add_disconnect_listener(&self, listener: DisconnectListener) -> ListenerId {
        self.disconnect_registrations.fetch_add(1, Ordering::Relaxed);
        self.disconnect_listeners.add(listener)
    }

    fn remove_disconnect_listener(&self, id: ListenerId) -> bool {
        self.disconnect_listeners.remove(id)
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::Relaxed);
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.notify_on_disconnect {
            self.notify_disconnect();
        }
    }
}

/// Runtime double: `connect` opens recording channels, `accept` simulates a
/// peer connecting to the host.
#[derive(Default)]
pub struct StubRuntime {
    connect_listeners: ListenerRegistry<dyn Fn(Arc<dyn Channel>) + Send + Sync>,
    opened: Mutex<Vec<Arc<RecordingChannel>>>,
}

impl StubRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Announce `channel` to every connect listener.
    pub fn accept(&self, channel: Arc<RecordingChannel>) {
        let channel: Arc<dyn Channel> = channel;
        for listener in self.connect_listeners.snapshot() {
            listener(channel.clone());
        }
    }

    /// Channels handed out by `connect`, in order.
    pub fn opened(&self) -> Vec<Arc<RecordingChannel>> {
        self.opened.lock().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn connect_listener_count(&self) -> usize {
        self.connect_listeners.len()
    }
}

impl ChannelRuntime for StubRuntime {
    fn connect(&self) -> Arc<dyn Channel> {
        let channel = RecordingChannel::new();
        self.opened.lock().push(channel.clone());
        channel
    }

    fn add_connect_listener(&self, listener: ConnectListener) -> ListenerId {
        self.connect_listeners.add(listener)
    }

    fn remove_connect_listener(&self, id: ListenerId) -> bool {
        self.connect_listeners.remove(id)
    }
}
