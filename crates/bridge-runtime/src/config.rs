//! # Runtime Configuration
//!
//! All knobs come from the environment and have defaults that make
//! `cargo run -p bridge-runtime` do something useful.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Demo runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of peer bridges connecting to the host.
    pub peers: usize,
    /// Ping/pong rounds each peer runs.
    pub rounds: usize,
    /// How long a peer waits for one pong.
    pub reply_timeout: Duration,
    /// Pings sent per round before a peer gives up.
    pub attempts: usize,
    /// Also drive the windows and tabs surfaces.
    pub dispatch_demo: bool,
    /// Print the Prometheus text output on exit.
    pub dump_metrics: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            peers: 3,
            rounds: 5,
            reply_timeout: Duration::from_millis(250),
            attempts: 5,
            dispatch_demo: true,
            dump_metrics: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PORTCAST_PEERS`: peer count (default: 3)
    /// - `PORTCAST_ROUNDS`: rounds per peer (default: 5)
    /// - `PORTCAST_REPLY_TIMEOUT_MS`: pong timeout (default: 250)
    /// - `PORTCAST_ATTEMPTS`: pings per round (default: 5)
    /// - `PORTCAST_DISPATCH_DEMO`: run the dispatch demo (default: true)
    /// - `PORTCAST_DUMP_METRICS`: print metrics on exit (default: false)
    ///
    /// Unparseable values keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            peers: parsed("PORTCAST_PEERS").unwrap_or(defaults.peers),
            rounds: parsed("PORTCAST_ROUNDS").unwrap_or(defaults.rounds),
            reply_timeout: parsed("PORTCAST_REPLY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.reply_timeout),
            attempts: parsed("PORTCAST_ATTEMPTS").unwrap_or(defaults.attempts),
            dispatch_demo: parsed("PORTCAST_DISPATCH_DEMO").unwrap_or(defaults.dispatch_demo),
            dump_metrics: parsed("PORTCAST_DUMP_METRICS").unwrap_or(defaults.dump_metrics),
        }
    }

    /// Reject configurations the runtime cannot make progress with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peers == 0 {
            return Err(ConfigError::NoPeers);
        }
        if self.attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if self.reply_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORTCAST_PEERS must be at least 1")]
    NoPeers,

    #[error("PORTCAST_ATTEMPTS must be at least 1")]
    NoAttempts,

    #[error("PORTCAST_REPLY_TIMEOUT_MS must be positive")]
    ZeroTimeout,
}
