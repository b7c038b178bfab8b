//! Process-unique identifiers for channels and listener registrations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static CHANNEL_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LISTENER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identity of a channel endpoint.
///
/// Two handles are the same channel iff their ids are equal; the value
/// carries no other meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(CHANNEL_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Handle returned by every `add_*_listener` call, used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(LISTENER_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}
