//! Ports Layer
//!
//! Driven ports for the host API behind each command surface. The driving
//! side reuses [`pc_01_message_bridge::MessageDriver`].

pub mod outbound;

pub use outbound::{EventListener, EventSource, TabsApi, WindowsApi};
