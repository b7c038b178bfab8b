//! Metrics hooks for bridge operations
//!
//! Counters for channel membership, subscription transitions and message
//! flow. Plug a [`MetricsRecorder`] into the bridge to export them.
//!
//! ## Usage
//!
//! ```ignore
//! use pc_01_message_bridge::{BridgeConfig, MessageBridge, Metrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(Metrics::new());
//! let bridge = MessageBridge::new(BridgeConfig::host(), runtime).with_metrics(metrics.clone());
//!
//! // ... later
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.subscriptions_acquired, snapshot.subscriptions_released);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for bridge operations
#[derive(Default)]
pub struct Metrics {
    /// Inbound stream activations
    pub activations: AtomicU64,
    /// Inbound stream deactivations
    pub deactivations: AtomicU64,
    /// Channels added to the live set
    pub channels_added: AtomicU64,
    /// Channels removed from the live set
    pub channels_removed: AtomicU64,
    /// Outbound subscriptions opened (0 -> 1 transitions)
    pub subscriptions_acquired: AtomicU64,
    /// Outbound subscriptions released (1 -> 0 transitions and teardown)
    pub subscriptions_released: AtomicU64,
    /// Successful per-channel sends
    pub messages_sent: AtomicU64,
    /// Per-channel sends that failed
    pub send_failures: AtomicU64,
    /// Messages forwarded to the inbound stream
    pub messages_received: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            activations: self.activations.load(Ordering::Relaxed),
            deactivations: self.deactivations.load(Ordering::Relaxed),
            channels_added: self.channels_added.load(Ordering::Relaxed),
            channels_removed: self.channels_removed.load(Ordering::Relaxed),
            subscriptions_acquired: self.subscriptions_acquired.load(Ordering::Relaxed),
            subscriptions_released: self.subscriptions_released.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
        }
    }

    /// Channels currently live according to the counters
    pub fn live_channels(&self) -> u64 {
        let added = self.channels_added.load(Ordering::Relaxed);
        let removed = self.channels_removed.load(Ordering::Relaxed);
        added.saturating_sub(removed)
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub activations: u64,
    pub deactivations: u64,
    pub channels_added: u64,
    pub channels_removed: u64,
    pub subscriptions_acquired: u64,
    pub subscriptions_released: u64,
    pub messages_sent: u64,
    pub send_failures: u64,
    pub messages_received: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to integrate with external metrics systems
/// like Prometheus.
pub trait MetricsRecorder: Send + Sync {
    /// Inbound stream became active
    fn record_activation(&self);

    /// Inbound stream was torn down
    fn record_deactivation(&self);

    /// A channel joined the live set
    fn record_channel_added(&self);

    /// A channel left the live set
    fn record_channel_removed(&self);

    /// Outbound subscription opened (`true`) or released (`false`)
    fn record_subscription(&self, acquired: bool);

    /// One broadcast finished
    fn record_broadcast(&self, delivered: usize, failed: usize);

    /// A message was handed to the inbound stream
    fn record_received(&self);
}

impl MetricsRecorder for Metrics {
    fn record_activation(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_deactivation(&self) {
        self.deactivations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_channel_added(&self) {
        self.channels_added.fetch_add(1, Ordering::Relaxed);
    }

    fn record_channel_removed(&self) {
        self.channels_removed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_subscription(&self, acquired: bool) {
        if acquired {
            self.subscriptions_acquired.fetch_add(1, Ordering::Relaxed);
        } else {
            self.subscriptions_released.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_broadcast(&self, delivered: usize, failed: usize) {
        self.messages_sent.fetch_add(delivered as u64, Ordering::Relaxed);
        self.send_failures.fetch_add(failed as u64, Ordering::Relaxed);
    }

    fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_activation(&self) {}
    fn record_deactivation(&self) {}
    fn record_channel_added(&self) {}
    fn record_channel_removed(&self) {}
    fn record_subscription(&self, _acquired: bool) {}
    fn record_broadcast(&self, _delivered: usize, _failed: usize) {}
    fn record_received(&self) {}
}
