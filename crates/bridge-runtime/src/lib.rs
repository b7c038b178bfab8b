//! # Bridge Runtime Library
//!
//! Exposes the demo runtime's pieces for testing. The entry point is the
//! `main.rs` binary.
//!
//! - `config` - environment configuration
//! - `host` - the host's ping/pong loop
//! - `peer` - one peer bridge's session
//! - `dispatch` - windows and tabs surfaces against an in-memory browser
//! - `runtime` - wires them together

pub mod config;
pub mod dispatch;
pub mod host;
pub mod peer;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use runtime::{BridgeRuntime, RunReport};
