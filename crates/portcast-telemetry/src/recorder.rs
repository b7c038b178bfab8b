//! Prometheus-backed metrics recorders for the bridge crates.

use pc_01_message_bridge::MetricsRecorder as BridgeRecorder;
use pc_02_command_dispatch::MetricsRecorder as DispatchRecorder;

use crate::metrics::{
    BRIDGE_LIFECYCLE, BROADCAST_FANOUT, CHANNELS_LIVE, COMMANDS, COMMANDS_REJECTED,
    DISPATCH_ACTIVE, HOST_EVENTS, MESSAGES_RECEIVED, MESSAGES_SENT, SUBSCRIPTIONS_HELD,
};

/// Records a message bridge into the global registry under its name.
#[derive(Debug, Clone)]
pub struct PrometheusBridgeRecorder {
    bridge: String,
}

impl PrometheusBridgeRecorder {
    pub fn new(bridge: impl Into<String>) -> Self {
        Self {
            bridge: bridge.into(),
        }
    }

    pub fn bridge(&self) -> &str {
        &self.bridge
    }
}

impl BridgeRecorder for PrometheusBridgeRecorder {
    fn record_activation(&self) {
        BRIDGE_LIFECYCLE
            .with_label_values(&[self.bridge.as_str(), "activated"])
            .inc();
    }

    fn record_deactivation(&self) {
        BRIDGE_LIFECYCLE
            .with_label_values(&[self.bridge.as_str(), "deactivated"])
            .inc();
    }

    fn record_channel_added(&self) {
        CHANNELS_LIVE.with_label_values(&[self.bridge.as_str()]).inc();
    }

    fn record_channel_removed(&self) {
        CHANNELS_LIVE.with_label_values(&[self.bridge.as_str()]).dec();
    }

    fn record_subscription(&self, acquired: bool) {
        let gauge = SUBSCRIPTIONS_HELD.with_label_values(&[self.bridge.as_str()]);
        if acquired {
            gauge.inc();
        } else {
            gauge.dec();
        }
    }

    fn record_broadcast(&self, delivered: usize, failed: usize) {
        MESSAGES_SENT
            .with_label_values(&[self.bridge.as_str(), "delivered"])
            .inc_by(delivered as u64);
        MESSAGES_SENT
            .with_label_values(&[self.bridge.as_str(), "failed"])
            .inc_by(failed as u64);
        BROADCAST_FANOUT
            .with_label_values(&[self.bridge.as_str()])
            .observe(delivered as f64);
    }

    fn record_received(&self) {
        MESSAGES_RECEIVED.with_label_values(&[self.bridge.as_str()]).inc();
    }
}

/// Records a dispatch bridge into the global registry under its surface name.
#[derive(Debug, Clone)]
pub struct PrometheusDispatchRecorder {
    surface: String,
}

impl PrometheusDispatchRecorder {
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
        }
    }
}

impl DispatchRecorder for PrometheusDispatchRecorder {
    fn record_activation(&self) {
        DISPATCH_ACTIVE.with_label_values(&[self.surface.as_str()]).inc();
    }

    fn record_deactivation(&self) {
        DISPATCH_ACTIVE.with_label_values(&[self.surface.as_str()]).dec();
    }

    fn record_dispatched(&self, command: &'static str) {
        COMMANDS
            .with_label_values(&[self.surface.as_str(), command, "dispatched"])
            .inc();
    }

    fn record_ignored(&self) {
        COMMANDS_REJECTED
            .with_label_values(&[self.surface.as_str(), "unknown"])
            .inc();
    }

    fn record_decode_failure(&self) {
        COMMANDS_REJECTED
            .with_label_values(&[self.surface.as_str(), "malformed"])
            .inc();
    }

    fn record_invocation_failure(&self, command: &'static str) {
        COMMANDS
            .with_label_values(&[self.surface.as_str(), command, "failed"])
            .inc();
    }

    fn record_event(&self, event: &'static str) {
        HOST_EVENTS.with_label_values(&[self.surface.as_str(), event]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_recorder_tracks_live_channels() {
        let recorder = PrometheusBridgeRecorder::new("recorder-live");
        recorder.record_channel_added();
        recorder.record_channel_added();
        recorder.record_channel_removed();

        assert_eq!(CHANNELS_LIVE.with_label_values(&["recorder-live"]).get(), 1);
    }

    #[test]
    fn test_bridge_recorder_splits_outcomes() {
        let recorder = PrometheusBridgeRecorder::new("recorder-broadcast");
        recorder.record_broadcast(3, 1);

        let delivered = MESSAGES_SENT.with_label_values(&["recorder-broadcast", "delivered"]);
        let failed = MESSAGES_SENT.with_label_values(&["recorder-broadcast", "failed"]);
        assert_eq!(delivered.get(), 3);
        assert_eq!(failed.get(), 1);
    }

    #[test]
    fn test_subscription_gauge_returns_to_zero() {
        let recorder = PrometheusBridgeRecorder::new("recorder-subscription");
        recorder.record_subscription(true);
        recorder.record_subscription(false);

        assert_eq!(
            SUBSCRIPTIONS_HELD
                .with_label_values(&["recorder-subscription"])
                .get(),
            0
        );
    }

    #[test]
    fn test_dispatch_recorder_labels_commands() {
        let recorder = PrometheusDispatchRecorder::new("recorder-tabs");
        recorder.record_dispatched("reload");
        recorder.record_invocation_failure("reload");
        recorder.record_ignored();

        assert_eq!(
            COMMANDS
                .with_label_values(&["recorder-tabs", "reload", "dispatched"])
                .get(),
            1
        );
        assert_eq!(
            COMMANDS_REJECTED
                .with_label_values(&["recorder-tabs", "unknown"])
                .get(),
            1
        );
    }
}
