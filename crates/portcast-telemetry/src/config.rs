//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to the console
    pub console_output: bool,

    /// Whether to format logs as JSON
    pub json_logs: bool,

    /// Whether to register the Prometheus collectors
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "portcast".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PORTCAST_SERVICE_NAME`: Service name (default: portcast)
    /// - `PORTCAST_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `PORTCAST_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PORTCAST_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `PORTCAST_METRICS`: Register Prometheus metrics (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("PORTCAST_SERVICE_NAME")
                .unwrap_or_else(|_| "portcast".to_string()),

            log_level: env::var("PORTCAST_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("PORTCAST_CONSOLE_OUTPUT")
                .map(|v| flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("PORTCAST_JSON_LOGS")
                .map(|v| flag(&v, false))
                .unwrap_or(is_container),

            metrics_enabled: env::var("PORTCAST_METRICS")
                .map(|v| flag(&v, true))
                .unwrap_or(true),
        }
    }

    /// Configuration for one named component, e.g. `host` or `peer-3`.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, component);
        config
    }
}

/// Parse a boolean switch. Unrecognised values fall back to `default`.
fn flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "portcast");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_flag_parsing() {
        assert!(flag("TRUE", false));
        assert!(flag(" 1 ", false));
        assert!(!flag("off", true));
        assert!(flag("maybe", true));
        assert!(!flag("maybe", false));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: TelemetryConfig =
            serde_json::from_str(r#"{"json_logs": true}"#).unwrap();
        assert!(config.json_logs);
        assert_eq!(config.service_name, "portcast");
    }
}
