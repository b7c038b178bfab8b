//! Adapters Layer
//!
//! Concrete channel transports.
//!
//! - `memory`: linked in-process channel pairs, for demos and tests

pub mod memory;

pub use memory::{MemoryChannel, MemoryRuntime};
