//! # Shared Types Crate
//!
//! This crate contains the `Message` envelope exchanged by every bridge and
//! the tag composition helper.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the `{type, payload}` shape is defined here
//!   and nowhere else.
//! - **Opaque Payloads**: bridges route on `type` only; payload schemas are
//!   owned by the callers.

pub mod errors;
pub mod message;

pub use errors::*;
pub use message::{compose, Message, MessageType};
