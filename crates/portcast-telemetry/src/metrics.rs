//! Prometheus metrics for Portcast bridges.
//!
//! All metrics follow the naming convention: `portcast_<area>_<metric>_<unit>`
//!
//! Message bridge metrics are labelled by bridge name, dispatch metrics by
//! surface name.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec,
    IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MESSAGE BRIDGE METRICS
    // =========================================================================

    /// Activations and deactivations of inbound streams
    pub static ref BRIDGE_LIFECYCLE: IntCounterVec = IntCounterVec::new(
        Opts::new("portcast_bridge_lifecycle_total", "Inbound stream activations and deactivations"),
        &["bridge", "transition"]  // transition: activated/deactivated
    ).expect("metric creation failed");

    /// Channels currently in the live set
    pub static ref CHANNELS_LIVE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("portcast_bridge_channels_live", "Channels currently connected to a bridge"),
        &["bridge"]
    ).expect("metric creation failed");

    /// Outbound subscriptions currently held
    pub static ref SUBSCRIPTIONS_HELD: IntGaugeVec = IntGaugeVec::new(
        Opts::new("portcast_bridge_subscriptions_held", "Outbound subscriptions currently held"),
        &["bridge"]
    ).expect("metric creation failed");

    /// Outbound deliveries by outcome
    pub static ref MESSAGES_SENT: IntCounterVec = IntCounterVec::new(
        Opts::new("portcast_bridge_messages_sent_total", "Outbound messages posted to channels"),
        &["bridge", "outcome"]  // outcome: delivered/failed
    ).expect("metric creation failed");

    /// Messages merged into the inbound stream
    pub static ref MESSAGES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("portcast_bridge_messages_received_total", "Inbound messages from channels"),
        &["bridge"]
    ).expect("metric creation failed");

    /// Channels reached per broadcast
    pub static ref BROADCAST_FANOUT: HistogramVec = HistogramVec::new(
        HistogramOpts::new("portcast_bridge_broadcast_fanout", "Channels reached by one broadcast")
            .buckets(exponential_buckets(1.0, 2.0, 10).unwrap_or_default()),
        &["bridge"]
    ).expect("metric creation failed");

    // =========================================================================
    // COMMAND DISPATCH METRICS
    // =========================================================================

    /// Commands by outcome
    pub static ref COMMANDS: IntCounterVec = IntCounterVec::new(
        Opts::new("portcast_dispatch_commands_total", "Commands handled by a surface"),
        &["surface", "command", "outcome"]  // outcome: dispatched/failed
    ).expect("metric creation failed");

    /// Messages that named no known command or failed to decode
    pub static ref COMMANDS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("portcast_dispatch_commands_rejected_total", "Outbound messages not dispatched"),
        &["surface", "reason"]  // reason: unknown/malformed
    ).expect("metric creation failed");

    /// Host events forwarded
    pub static ref HOST_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("portcast_dispatch_host_events_total", "Host events received by a surface"),
        &["surface", "event"]
    ).expect("metric creation failed");

    /// Live dispatch streams
    pub static ref DISPATCH_ACTIVE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("portcast_dispatch_active", "Dispatch streams currently active"),
        &["surface"]
    ).expect("metric creation failed");

    // =========================================================================
    // RUNTIME METRICS
    // =========================================================================

    /// Round trip time of a demo exchange
    pub static ref ROUND_TRIP: Histogram = Histogram::with_opts(
        HistogramOpts::new("portcast_runtime_round_trip_seconds", "Time from request to reply")
            .buckets(exponential_buckets(0.00001, 2.0, 15).unwrap_or_default())
    ).expect("metric creation failed");
}

/// Proof that the collectors are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Message bridge
        Box::new(BRIDGE_LIFECYCLE.clone()),
        Box::new(CHANNELS_LIVE.clone()),
        Box::new(SUBSCRIPTIONS_HELD.clone()),
        Box::new(MESSAGES_SENT.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(BROADCAST_FANOUT.clone()),
        // Command dispatch
        Box::new(COMMANDS.clone()),
        Box::new(COMMANDS_REJECTED.clone()),
        Box::new(HOST_EVENTS.clone()),
        Box::new(DISPATCH_ACTIVE.clone()),
        // Runtime
        Box::new(ROUND_TRIP.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Render every registered metric in the Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
