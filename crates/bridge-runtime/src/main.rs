//! # Portcast Bridge Runtime
//!
//! Demo executable: one host bridge, several peer bridges, and the command
//! dispatch surfaces, all in one process over in-memory channels.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry from the environment
//! 2. Load and validate the runtime configuration
//! 3. Attach the host bridge and spawn its loop
//! 4. Spawn the peers and wait for their rounds
//! 5. Run the dispatch demo
//! 6. Shut the host down and report

use anyhow::{Context, Result};
use tracing::{info, warn};

use bridge_runtime::{BridgeRuntime, RuntimeConfig};
use portcast_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = init_telemetry(TelemetryConfig::for_component("runtime"))
        .context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    config.validate().context("Invalid runtime configuration")?;

    let runtime = BridgeRuntime::new(config.clone());
    let report = tokio::select! {
        report = runtime.run() => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
            runtime.shutdown();
            return Ok(());
        }
    };

    for peer in &report.peers {
        info!(
            peer = peer.peer,
            rounds = peer.rounds,
            pings = peer.pings_sent,
            slowest_us = peer.slowest.as_micros() as u64,
            "Peer report"
        );
    }
    if let Some(dispatch) = &report.dispatch {
        info!(
            tabs = dispatch.tabs_at_end,
            host_calls = dispatch.host_calls,
            "Dispatch report"
        );
    }

    if config.dump_metrics && telemetry.metrics_enabled() {
        println!("{}", encode_metrics().context("Failed to encode metrics")?);
    }

    Ok(())
}
