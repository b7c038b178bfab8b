//! In-memory [`EventSource`].

use parking_lot::Mutex;
use pc_01_message_bridge::{ListenerId, ListenerRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::ports::{EventListener, EventSource};

type Registry = ListenerRegistry<dyn Fn(Vec<Value>) + Send + Sync>;

/// Named event registry that tests and demos fire by hand.
#[derive(Default)]
pub struct MemoryEventSource {
    events: Mutex<HashMap<String, Arc<Registry>>>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` with `args`. Returns how many listeners ran.
    pub fn emit(&self, event: &str, args: Vec<Value>) -> usize {
        let registry = self.events.lock().get(event).cloned();
        let Some(registry) = registry else {
            trace!(event, "Event fired with no listeners");
            return 0;
        };

        let listeners = registry.snapshot();
        for listener in &listeners {
            listener(args.clone());
        }
        trace!(event, listeners = listeners.len(), "Event fired");
        listeners.len()
    }

    /// Listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.events.lock().get(event).map_or(0, |registry| registry.len())
    }

    /// Listeners registered across every event.
    pub fn total_listeners(&self) -> usize {
        self.events.lock().values().map(|registry| registry.len()).sum()
    }
}

impl EventSource for MemoryEventSource {
    fn add_listener(&self, event: &str, listener: EventListener) -> ListenerId {
        let registry = Arc::clone(self.events.lock().entry(event.to_string()).or_default());
        registry.add(listener)
    }

    fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let registry = self.events.lock().get(event).cloned();
        registry.is_some_and(|registry| registry.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_named_listeners_only() {
        let source = MemoryEventSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        source.add_listener(
            "onRemoved",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(source.emit("onRemoved", vec![json!(1)]), 1);
        assert_eq!(source.emit("onCreated", vec![json!({})]), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let source = MemoryEventSource::new();
        let id = source.add_listener("onMoved", Arc::new(|_| {}));

        assert!(!source.remove_listener("onRemoved", id));
        assert!(source.remove_listener("onMoved", id));
        assert_eq!(source.total_listeners(), 0);
    }

    #[test]
    fn test_listener_receives_arguments() {
        let source = MemoryEventSource::new();
        let seen = Arc::new(Mutex::new(Vec::<Vec<Value>>::new()));
        let sink = Arc::clone(&seen);
        source.add_listener("onZoomChange", Arc::new(move |args| sink.lock().push(args)));

        source.emit("onZoomChange", vec![json!({"newZoomFactor": 2.0})]);

        assert_eq!(seen.lock()[0], vec![json!({"newZoomFactor": 2.0})]);
    }
}
