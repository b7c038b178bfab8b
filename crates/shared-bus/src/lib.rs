//! # Shared Bus - Outbound Message Bus
//!
//! The application publishes outbound messages here; bridges subscribe while
//! they have somewhere to deliver them.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Application  │                    │    Bridge    │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  MessageBus  │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - **No replay:** a subscription sees only messages published after it
//!   was opened.
//! - **Drop when idle:** with no open subscription a published message is
//!   counted and discarded.
//! - **No back-pressure:** a subscription that falls more than the bus
//!   capacity behind skips the oldest messages.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod filter;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use filter::{filter_by_path, filter_by_type, PayloadStream};
pub use publisher::{MessageBus, MessagePublisher, MessageSource};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum messages to buffer per subscription before the oldest are lost.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
