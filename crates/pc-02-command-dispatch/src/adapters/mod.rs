//! Adapters Layer
//!
//! In-process stand-ins for a host: an event registry and a browser that
//! keeps windows and tabs in memory.

pub mod browser;
pub mod event_source;

pub use browser::MemoryBrowser;
pub use event_source::MemoryEventSource;
