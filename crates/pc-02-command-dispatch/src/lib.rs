//! # PC-02 Command Dispatch
//!
//! Turns outbound messages into host API calls and host events into inbound
//! messages. The message type names the command; the payload carries its
//! positional arguments.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): command vocabulary
//!   - `ArgList`: positional arguments decoded from a payload
//!   - `WindowCommand`, `TabCommand`: typed commands per surface
//!   - `Window`, `Tab`: host records
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `WindowsApi`, `TabsApi`: Driven ports (the host)
//!   - `EventSource`: host event registry
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `CommandDispatchBridge`: hands out the inbound stream
//!   - `CommandSurface`: what a surface dispatches and forwards
//!   - `WindowSurface`, `TabSurface`: the two surfaces
//!
//! - **Adapters Layer** (`adapters/`): In-memory host
//!   - `MemoryBrowser`, `MemoryEventSource`
//!
//! ## Behaviour
//!
//! - Unknown command names are ignored.
//! - A failed host call is logged and never ends the stream.
//! - The windows surface emits an `allWindows` snapshot on activation and
//!   forwards created windows with their tabs filled in.
//!
//! ## Usage Example
//!
//! ```ignore
//! use pc_02_command_dispatch::{CommandDispatchBridge, DispatchConfig, MemoryBrowser, TabSurface};
//!
//! let browser = Arc::new(MemoryBrowser::new());
//! let surface = TabSurface::new(browser.clone(), browser.tabs_events());
//! let config = DispatchConfig::default();
//! let commands = Arc::new(config.outbound_bus());
//!
//! let bridge = CommandDispatchBridge::new(surface, config);
//! let mut events = bridge.attach(commands.clone())?;
//!
//! commands.send(Message::new("create", json!([{"url": "https://example.org"}])));
//! let created = events.next().await;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{MemoryBrowser, MemoryEventSource};
pub use config::DispatchConfig;
pub use domain::{
    ArgList, DispatchCommand, Tab, TabCommand, TabId, Window, WindowCommand, WindowId, ALL_WINDOWS,
    TAB_EVENTS, WINDOW_CREATED, WINDOW_EVENTS,
};
pub use error::{DispatchError, HostError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{EventListener, EventSource, TabsApi, WindowsApi};
pub use service::{
    CommandDispatchBridge, CommandSurface, DispatchStream, Invocation, Reaction, TabSurface,
    WindowSurface,
};
