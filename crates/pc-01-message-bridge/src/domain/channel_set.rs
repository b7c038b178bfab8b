//! Registry of live channels.
//!
//! ## Invariants
//!
//! - A channel is a member iff it was added and has not been removed since.
//! - Each member has exactly one message listener and one disconnect listener
//!   registered by this set.
//! - The outbound subscription is held iff the set is non-empty, unless the
//!   outbound source has already closed.

use futures::StreamExt;
use shared_bus::{MessageSource, Subscription};
use shared_types::Message;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

use super::ids::{ChannelId, ListenerId};
use super::signal::Observer;
use crate::metrics::MetricsRecorder;
use crate::ports::Channel;

/// Outcome of broadcasting one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Channels that accepted the message.
    pub delivered: usize,
    /// Channels whose send failed.
    pub failed: usize,
}

struct Member {
    channel: Arc<dyn Channel>,
    message_listener: ListenerId,
    disconnect_listener: ListenerId,
}

/// Live channels plus the outbound subscription that feeds them.
pub struct ChannelSet {
    /// Members in registration order.
    members: Vec<Member>,
    /// Where outbound messages come from.
    source: Arc<dyn MessageSource>,
    /// The subscription token.
    subscription: Option<Subscription>,
    /// Set once the source has ended; no further subscriptions are opened.
    outbound_closed: bool,
    /// Listener side of the bridge's signal queue.
    observer: Observer,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ChannelSet {
    pub fn new(
        source: Arc<dyn MessageSource>,
        observer: Observer,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            members: Vec::new(),
            source,
            subscription: None,
            outbound_closed: false,
            observer,
            metrics,
        }
    }

    /// Register a channel.
    ///
    /// Returns `false` without side effects if the channel is already a
    /// member. The first member opens the outbound subscription.
    pub fn add(&mut self, channel: Arc<dyn Channel>) -> bool {
        let id = channel.id();
        if self.contains(id) {
            trace!(channel = %id, "Channel already registered");
            return false;
        }

        if self.members.is_empty() {
            self.acquire();
        }

        let observer = self.observer.clone();
        let message_listener =
            channel.add_message_listener(Arc::new(move |message| observer.next(id, message)));
        let observer = self.observer.clone();
        let disconnect_listener =
            channel.add_disconnect_listener(Arc::new(move |closed| observer.disconnected(closed)));

        self.members.push(Member {
            channel,
            message_listener,
            disconnect_listener,
        });
        self.metrics.record_channel_added();
        debug!(channel = %id, live = self.members.len(), "Channel connected");
        true
    }

    /// Deregister a channel.
    ///
    /// Returns `false` if it was not a member. Removing the last member
    /// releases the outbound subscription.
    pub fn remove(&mut self, id: ChannelId) -> bool {
        let Some(index) = self.members.iter().position(|m| m.channel.id() == id) else {
            trace!(channel = %id, "Channel not registered");
            return false;
        };

        let member = self.members.remove(index);
        member
            .channel
            .remove_message_listener(member.message_listener);
        member
            .channel
            .remove_disconnect_listener(member.disconnect_listener);
        self.metrics.record_channel_removed();
        debug!(channel = %id, live = self.members.len(), "Channel disconnected");

        if self.members.is_empty() {
            self.release();
        }
        true
    }

    /// Deregister every member without waiting for disconnect notifications.
    ///
    /// Returns how many members were still registered.
    pub fn clear(&mut self) -> usize {
        let remaining: Vec<ChannelId> = self.ids();
        for id in &remaining {
            self.remove(*id);
        }
        remaining.len()
    }

    /// Send `message` to every member, in registration order.
    ///
    /// A failing channel is logged and skipped; the others still receive the
    /// message and membership is unchanged.
    pub fn broadcast(&self, message: &Message) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for member in &self.members {
            match member.channel.post(message) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    report.failed += 1;
                    warn!(
                        channel = %member.channel.id(),
                        message_type = message.message_type(),
                        error = %error,
                        "Failed to send message"
                    );
                }
            }
        }
        self.metrics
            .record_broadcast(report.delivered, report.failed);
        trace!(
            message_type = message.message_type(),
            delivered = report.delivered,
            failed = report.failed,
            "Message broadcast"
        );
        report
    }

    /// Poll the outbound subscription for the next message to broadcast.
    ///
    /// Pending while no subscription is held. When the source ends the
    /// subscription is released for good.
    pub fn poll_outbound(&mut self, cx: &mut Context<'_>) -> Poll<Message> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Poll::Pending;
        };

        match subscription.poll_next_unpin(cx) {
            Poll::Ready(Some(message)) => Poll::Ready(message),
            Poll::Ready(None) => {
                debug!("Outbound source closed, releasing subscription");
                self.outbound_closed = true;
                self.release();
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }

    /// Release the outbound subscription regardless of membership.
    pub fn release_subscription(&mut self) {
        self.release();
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.members.iter().any(|m| m.channel.id() == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member ids in registration order.
    pub fn ids(&self) -> Vec<ChannelId> {
        self.members.iter().map(|m| m.channel.id()).collect()
    }

    /// Member handles in registration order.
    pub fn channels(&self) -> Vec<Arc<dyn Channel>> {
        self.members.iter().map(|m| Arc::clone(&m.channel)).collect()
    }

    /// Whether the subscription token is held.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether the outbound source has ended.
    pub fn is_outbound_closed(&self) -> bool {
        self.outbound_closed
    }

    fn acquire(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        if self.outbound_closed {
            debug!("Outbound source closed, not subscribing");
            return;
        }
        self.subscription = Some(self.source.subscribe());
        self.metrics.record_subscription(true);
        debug!("Outbound subscription acquired");
    }

    fn release(&mut self) {
        if self.subscription.take().is_some() {
            self.metrics.record_subscription(false);
            debug!("Outbound subscription released");
        }
    }
}
