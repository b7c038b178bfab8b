//! # Portcast Telemetry
//!
//! Logging and metrics for Portcast bridges.
//!
//! ## Components
//!
//! - **Logs**: a `tracing-subscriber` registry with an `EnvFilter` and a
//!   pretty or JSON formatter
//! - **Metrics**: Prometheus collectors in a global registry, fed by
//!   recorders that plug into the bridge crates
//!
//! ## Usage
//!
//! ```rust,ignore
//! use portcast_telemetry::{init_telemetry, PrometheusBridgeRecorder, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!
//!     let bridge = MessageBridge::new(config, runtime)
//!         .with_metrics(Arc::new(PrometheusBridgeRecorder::new("host")));
//!     // ...
//!     println!("{}", portcast_telemetry::encode_metrics()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORTCAST_SERVICE_NAME` | `portcast` | Service name in logs |
//! | `PORTCAST_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `PORTCAST_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `PORTCAST_JSON_LOGS` | `false` | JSON log lines |
//! | `PORTCAST_METRICS` | `true` | Register Prometheus collectors |

mod config;
pub mod metrics;
mod recorder;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{encode_metrics, register_metrics, MetricsHandle, REGISTRY};
pub use recorder::{PrometheusBridgeRecorder, PrometheusDispatchRecorder};
pub use tracing_setup::{env_filter, init_tracing};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, if enabled, metrics.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    metrics: Option<MetricsHandle>,
}

impl TelemetryGuard {
    /// Whether Prometheus collectors were registered.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Span carrying the bridge name.
///
/// # Example
///
/// ```rust,ignore
/// let _span = portcast_telemetry::bridge_span!("round", bridge = "host", round = 3).entered();
/// ```
#[macro_export]
macro_rules! bridge_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_span_carries_name_and_fields() {
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let span = bridge_span!("peer", bridge = "peer-0", round = 3);
            let metadata = span.metadata().expect("span enabled under registry");
            assert_eq!(metadata.name(), "peer");
            assert!(metadata.fields().field("bridge").is_some());
            assert!(metadata.fields().field("round").is_some());
        });
    }

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "portcast");
        assert!(config.metrics_enabled);
    }
}
