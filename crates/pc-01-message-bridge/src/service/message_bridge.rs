//! Message Bridge Service
//!
//! Connects an outbound [`MessageSource`] to a dynamic set of channels and
//! merges everything the channels receive into one [`InboundStream`].
//!
//! ## Lifecycle
//!
//! ```text
//!   attach()        first poll             drop() / close()
//! ──────────▶ Inactive ──────────▶ Active ──────────────────▶ Closed
//!                                   │
//!                                   ├─ host: accept listener adds channels
//!                                   └─ peer: one channel opened at once
//! ```
//!
//! All bookkeeping happens inside `poll_next`. Channel listeners only queue
//! [`BridgeSignal`]s, so the channel set is never touched from a callback.

use futures::Stream;
use shared_bus::MessageSource;
use shared_types::Message;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::domain::{BridgeSignal, ChannelSet, ListenerId, Observer};
use crate::error::BridgeError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{ChannelRuntime, MessageDriver};

/// Multiplexing bridge between an application and a channel runtime.
///
/// Message loss is silent: outbound messages published while no channel is
/// live are dropped, and a channel whose send fails simply misses that
/// message.
pub struct MessageBridge {
    config: BridgeConfig,
    runtime: Arc<dyn ChannelRuntime>,
    metrics: Arc<dyn MetricsRecorder>,
    activations: Arc<AtomicU64>,
    attached: Arc<AtomicBool>,
}

impl MessageBridge {
    pub fn new(config: BridgeConfig, runtime: Arc<dyn ChannelRuntime>) -> Self {
        Self {
            config,
            runtime,
            metrics: Arc::new(NoOpMetrics),
            activations: Arc::new(AtomicU64::new(0)),
            attached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report lifecycle and traffic counters to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Connect `outbound` to the channels and return the inbound stream.
    ///
    /// The stream is cold: no channel is opened or accepted until it is first
    /// polled. Dropping it closes every channel and releases every listener.
    ///
    /// # Errors
    ///
    /// [`BridgeError::AlreadyAttached`] while a previous inbound stream of
    /// this bridge is still alive.
    pub fn attach(&self, outbound: Arc<dyn MessageSource>) -> Result<InboundStream, BridgeError> {
        if self.attached.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::AlreadyAttached);
        }
        trace!(bridge = %self.config.name, "Inbound stream attached");

        Ok(InboundStream {
            state: State::Inactive { outbound },
            name: self.config.name.clone(),
            initiates: self.config.initiates,
            runtime: Arc::clone(&self.runtime),
            metrics: Arc::clone(&self.metrics),
            activations: Arc::clone(&self.activations),
            guard: Some(AttachGuard(Arc::clone(&self.attached))),
        })
    }

    /// Number of times an inbound stream of this bridge became active.
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    /// Whether this bridge opens its own channel.
    pub fn initiates(&self) -> bool {
        self.config.initiates
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl MessageDriver for MessageBridge {
    type Inbound = InboundStream;
    type Error = BridgeError;

    fn attach(&self, outbound: Arc<dyn MessageSource>) -> Result<InboundStream, BridgeError> {
        MessageBridge::attach(self, outbound)
    }
}

/// Clears the bridge's attached flag when the stream goes away.
struct AttachGuard(Arc<AtomicBool>);

impl Drop for AttachGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum State {
    Inactive { outbound: Arc<dyn MessageSource> },
    Active(Active),
    Closed,
}

struct Active {
    channels: ChannelSet,
    signals: mpsc::UnboundedReceiver<BridgeSignal>,
    accept_listener: Option<ListenerId>,
}

/// The merged stream of messages received on every live channel.
///
/// Polling it is what drives the bridge: accepted channels are added,
/// disconnected ones removed and outbound messages broadcast, all from
/// within `poll_next`.
pub struct InboundStream {
    state: State,
    name: String,
    initiates: bool,
    runtime: Arc<dyn ChannelRuntime>,
    metrics: Arc<dyn MetricsRecorder>,
    activations: Arc<AtomicU64>,
    guard: Option<AttachGuard>,
}

impl InboundStream {
    /// Live channels right now. Zero unless active.
    pub fn channel_count(&self) -> usize {
        match &self.state {
            State::Active(active) => active.channels.len(),
            _ => 0,
        }
    }

    /// Whether the stream has been polled and not yet closed.
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Whether the outbound subscription is held.
    pub fn is_subscribed(&self) -> bool {
        match &self.state {
            State::Active(active) => active.channels.is_subscribed(),
            _ => false,
        }
    }

    /// Tear down now instead of on drop. The stream then yields `None`.
    pub fn close(&mut self) {
        self.deactivate();
        self.state = State::Closed;
        self.guard = None;
    }

    fn activate(&mut self) {
        let State::Inactive { outbound } = std::mem::replace(&mut self.state, State::Closed) else {
            return;
        };

        let (observer, signals) = Observer::channel();
        let mut channels = ChannelSet::new(outbound, observer.clone(), Arc::clone(&self.metrics));

        let accept_listener = if self.initiates {
            let channel = self.runtime.connect();
            debug!(bridge = %self.name, channel = %channel.id(), "Opened channel to host");
            channels.add(channel);
            None
        } else {
            let id = self
                .runtime
                .add_connect_listener(Arc::new(move |channel| observer.accepted(channel)));
            Some(id)
        };

        self.state = State::Active(Active {
            channels,
            signals,
            accept_listener,
        });
        self.activations.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_activation();
        debug!(bridge = %self.name, initiates = self.initiates, "Bridge activated");
    }

    fn deactivate(&mut self) {
        let State::Active(mut active) = std::mem::replace(&mut self.state, State::Closed) else {
            return;
        };

        if let Some(id) = active.accept_listener.take() {
            self.runtime.remove_connect_listener(id);
        }
        active.channels.release_subscription();

        for channel in active.channels.channels() {
            channel.disconnect();
        }

        // Disconnect notifications raised above are already queued.
        while let Ok(signal) = active.signals.try_recv() {
            match signal {
                BridgeSignal::Disconnected(id) => {
                    active.channels.remove(id);
                }
                BridgeSignal::Accepted(channel) => {
                    trace!(
                        bridge = %self.name,
                        channel = %channel.id(),
                        "Closing channel accepted during teardown"
                    );
                    channel.disconnect();
                }
                BridgeSignal::Inbound { .. } => {}
            }
        }

        let stale = active.channels.clear();
        if stale > 0 {
            warn!(
                bridge = %self.name,
                stale,
                "Channels did not report disconnect, removed anyway"
            );
        }

        self.metrics.record_deactivation();
        debug!(bridge = %self.name, "Bridge deactivated");
    }
}

impl Active {
    /// Broadcast every outbound message queued so far to the current members.
    fn flush_outbound(&mut self, cx: &mut Context<'_>) {
        while let Poll::Ready(message) = self.channels.poll_outbound(cx) {
            self.channels.broadcast(&message);
        }
    }

    /// Apply one queued signal. Returns a message to hand to the consumer.
    fn apply(
        &mut self,
        signal: BridgeSignal,
        name: &str,
        metrics: &dyn MetricsRecorder,
    ) -> Option<Message> {
        match signal {
            BridgeSignal::Accepted(channel) => {
                self.channels.add(channel);
                None
            }
            BridgeSignal::Disconnected(id) => {
                self.channels.remove(id);
                None
            }
            BridgeSignal::Inbound { channel, message } => {
                if !self.channels.contains(channel) {
                    trace!(bridge = %name, channel = %channel, "Dropping message from removed channel");
                    return None;
                }
                trace!(
                    bridge = %name,
                    channel = %channel,
                    message_type = message.message_type(),
                    "Message received"
                );
                metrics.record_received();
                Some(message)
            }
        }
    }
}

impl Stream for InboundStream {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        let this = self.get_mut();
        if matches!(this.state, State::Inactive { .. }) {
            this.activate();
        }

        let State::Active(active) = &mut this.state else {
            return Poll::Ready(None);
        };

        while let Poll::Ready(Some(signal)) = active.signals.poll_recv(cx) {
            // Outbound already queued belongs to the members present before the join.
            if matches!(signal, BridgeSignal::Accepted(_)) {
                active.flush_outbound(cx);
            }
            if let Some(message) = active.apply(signal, &this.name, this.metrics.as_ref()) {
                return Poll::Ready(Some(message));
            }
        }

        active.flush_outbound(cx);
        Poll::Pending
    }
}

impl Drop for InboundStream {
    fn drop(&mut self) {
        self.deactivate();
    }
}
