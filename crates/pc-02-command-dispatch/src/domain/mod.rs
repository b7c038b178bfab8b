//! Domain Layer - command and event vocabulary
//!
//! This layer contains:
//! - Positional argument decoding
//! - Typed window and tab commands
//! - Host window and tab records
//! - Names of the events each surface forwards
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod args;
pub mod browser;
pub mod command;
pub mod events;

pub use args::ArgList;
pub use browser::{Tab, TabId, Window, WindowId};
pub use command::{DispatchCommand, TabCommand, WindowCommand};
pub use events::{ALL_WINDOWS, TAB_EVENTS, WINDOW_CREATED, WINDOW_EVENTS};
