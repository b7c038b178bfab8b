//! Service Layer
//!
//! The dispatch bridge and the surfaces it can drive.

pub mod dispatch_bridge;
pub mod surface;
pub mod tabs;
pub mod windows;

pub use dispatch_bridge::{CommandDispatchBridge, DispatchStream};
pub use surface::{CommandSurface, Invocation, Reaction};
pub use tabs::TabSurface;
pub use windows::WindowSurface;
