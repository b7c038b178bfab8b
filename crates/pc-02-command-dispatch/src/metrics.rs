//! Metrics hooks for command dispatch

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for dispatch operations
#[derive(Default)]
pub struct Metrics {
    /// Inbound stream activations
    pub activations: AtomicU64,
    /// Inbound stream deactivations
    pub deactivations: AtomicU64,
    /// Commands decoded and handed to the host
    pub commands_dispatched: AtomicU64,
    /// Outbound messages with no matching command
    pub commands_ignored: AtomicU64,
    /// Commands dropped because their arguments did not decode
    pub decode_failures: AtomicU64,
    /// Host calls that failed
    pub invocation_failures: AtomicU64,
    /// Host events received while active
    pub events_received: AtomicU64,
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
            commands_dispatched: self.commands_dispatched.load(Ordering::Relaxed),
            commands_ignored: self.commands_ignored.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            invocation_failures: self.invocation_failures.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub activations: u64,
    pub deactivations: u64,
    pub commands_dispatched: u64,
    pub commands_ignored: u64,
    pub decode_failures: u64,
    pub invocation_failures: u64,
    pub events_received: u64,
}

/// Trait for custom metrics recording implementations
pub trait MetricsRecorder: Send + Sync {
    fn record_activation(&self);
    fn record_deactivation(&self);
    fn record_dispatched(&self, command: &'static str);
    fn record_ignored(&self);
    fn record_decode_failure(&self);
    fn record_invocation_failure(&self, command: &'static str);
    fn record_event(&self, event: &'static str);
}

impl MetricsRecorder for Metrics {
    fn record_activation(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_deactivation(&self) {
        self.deactivations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dispatched(&self, _command: &'static str) {
        self.commands_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn record_ignored(&self) {
        self.commands_ignored.fetch_add(1, Ordering::Relaxed);
    }

    fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_invocation_failure(&self, _command: &'static str) {
        self.invocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_event(&self, _event: &'static str) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_activation(&self) {}
    fn record_deactivation(&self) {}
    fn record_dispatched(&self, _command: &'static str) {}
    fn record_ignored(&self) {}
    fn record_decode_failure(&self) {}
    fn record_invocation_failure(&self, _command: &'static str) {}
    fn record_event(&self, _event: &'static str) {}
}
