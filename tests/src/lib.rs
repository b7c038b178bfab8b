//! # Portcast Test Suite
//!
//! Cross-crate integration flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── bridge_flows.rs    # host/peer lifecycle over recording and in-memory channels
//!     ├── dispatch_flows.rs  # windows and tabs surfaces against an in-memory browser
//!     └── routing.rs         # tag composition and path filtering over a bridge
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p portcast-tests
//!
//! # By flow
//! cargo test -p portcast-tests integration::bridge_flows::
//! cargo test -p portcast-tests integration::dispatch_flows::
//! ```

pub mod integration;
