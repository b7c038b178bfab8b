//! Listener registry shared by channel and event-source implementations.
//!
//! Callbacks are always invoked on a snapshot taken outside the lock, so a
//! listener may register or deregister listeners while being notified.

use parking_lot::Mutex;
use std::sync::Arc;

use super::ids::ListenerId;

/// Ordered set of callbacks keyed by [`ListenerId`].
pub struct ListenerRegistry<F: ?Sized> {
    entries: Mutex<Vec<(ListenerId, Arc<F>)>>,
}

impl<F: ?Sized> ListenerRegistry<F> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback.
    pub fn add(&self, listener: Arc<F>) -> ListenerId {
        let id = ListenerId::next();
        self.entries.lock().push((id, listener));
        id
    }

    /// Deregister a callback. Returns `false` if `id` was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Callbacks in registration order.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
