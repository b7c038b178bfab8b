//! # Message Publisher
//!
//! Defines the publishing side of the outbound bus.

use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing messages to the bus.
///
/// This is the interface application code uses to emit outbound messages.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscriptions that received the message. Zero
    /// means the message was dropped.
    async fn publish(&self, message: Message) -> usize;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// Source of outbound messages that a bridge can subscribe to.
///
/// A subscription only sees messages published after it was opened; there is
/// no replay.
pub trait MessageSource: Send + Sync {
    /// Open a new subscription.
    fn subscribe(&self) -> Subscription;

    /// Number of currently open subscriptions.
    fn subscriber_count(&self) -> usize;
}

/// In-memory outbound bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Messages published while nobody is subscribed are dropped.
pub struct MessageBus {
    /// Broadcast sender. `None` once the bus has been closed.
    sender: RwLock<Option<broadcast::Sender<Message>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Messages published with no subscriber.
    messages_dropped: AtomicU64,

    /// Total subscriptions ever opened.
    subscriptions_opened: Arc<AtomicU64>,

    /// Channel capacity.
    capacity: usize,
}

impl MessageBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
            messages_published: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
            subscriptions_opened: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Close the bus.
    ///
    /// Open subscriptions end after draining what they already buffered.
    /// Later subscriptions end immediately and later publishes are dropped.
    pub fn close(&self) {
        let Ok(mut sender) = self.sender.write() else {
            return;
        };
        if sender.take().is_some() {
            debug!("Message bus closed");
        }
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.read().map(|s| s.is_none()).unwrap_or(true)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages published while no subscription was open.
    #[must_use]
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }

    /// Total subscriptions ever opened on this bus.
    #[must_use]
    pub fn subscriptions_opened(&self) -> u64 {
        self.subscriptions_opened.load(Ordering::Relaxed)
    }

    /// Publish without going through the async trait.
    pub fn send(&self, message: Message) -> usize {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        let message_type = message.message_type().to_string();

        let result = match self.sender.read() {
            Ok(sender) => match sender.as_ref() {
                Some(sender) => sender.send(message).ok(),
                None => None,
            },
            Err(_) => None,
        };

        match result {
            Some(receivers) => {
                trace!(
                    message_type = %message_type,
                    receivers,
                    "Message published"
                );
                receivers
            }
            None => {
                self.messages_dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    message_type = %message_type,
                    "Message dropped (no subscribers)"
                );
                0
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSource for MessageBus {
    fn subscribe(&self) -> Subscription {
        let receiver = match self.sender.read() {
            Ok(sender) => sender.as_ref().map(broadcast::Sender::subscribe),
            Err(_) => None,
        };
        let receiver = receiver.unwrap_or_else(|| {
            // Closed bus: hand out a receiver whose sender is already gone.
            let (_, receiver) = broadcast::channel(1);
            receiver
        });

        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
        debug!("New subscription created");

        Subscription::new(receiver)
    }

    fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessagePublisher for MessageBus {
    async fn publish(&self, message: Message) -> usize {
        self.send(message)
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
