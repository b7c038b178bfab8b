//! Command Dispatch Bridge Service
//!
//! Same lifecycle as the message bridge, over a single command surface
//! instead of a set of channels:
//!
//! - on first poll: subscribe to the command bus, register the surface's
//!   event listeners and start its activation calls;
//! - while active: decode each outbound message into a command and run it,
//!   forward host events and call results as inbound messages;
//! - on drop or `close`: remove every listener, release the subscription and
//!   abandon calls still in flight.

use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use pc_01_message_bridge::{ListenerId, MessageDriver};
use serde_json::Value;
use shared_bus::{MessageSource, Subscription};
use shared_types::Message;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::surface::{CommandSurface, Invocation, Reaction};
use crate::config::DispatchConfig;
use crate::domain::{ArgList, DispatchCommand};
use crate::error::DispatchError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::EventSource;

/// Bridges an outbound command stream to a [`CommandSurface`].
pub struct CommandDispatchBridge<S> {
    surface: Arc<S>,
    config: DispatchConfig,
    metrics: Arc<dyn MetricsRecorder>,
    activations: Arc<AtomicU64>,
    attached: Arc<AtomicBool>,
}

impl<S: CommandSurface> CommandDispatchBridge<S> {
    pub fn new(surface: S, config: DispatchConfig) -> Self {
        Self {
            surface: Arc::new(surface),
            config,
            metrics: Arc::new(NoOpMetrics),
            activations: Arc::new(AtomicU64::new(0)),
            attached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Connect `commands` to the surface and return the inbound stream.
    ///
    /// Cold like [`pc_01_message_bridge::MessageBridge::attach`]: nothing is
    /// subscribed or registered until the stream is first polled.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AlreadyAttached`] while a previous stream of this
    /// bridge is still alive.
    pub fn attach(&self, commands: Arc<dyn MessageSource>) -> Result<DispatchStream<S>, DispatchError> {
        if self.attached.swap(true, Ordering::AcqRel) {
            return Err(DispatchError::AlreadyAttached);
        }

        Ok(DispatchStream {
            state: State::Inactive { commands },
            surface: Arc::clone(&self.surface),
            register_event_listeners: self.config.register_event_listeners,
            metrics: Arc::clone(&self.metrics),
            activations: Arc::clone(&self.activations),
            guard: Some(AttachGuard(Arc::clone(&self.attached))),
        })
    }

    /// Number of times a stream of this bridge became active.
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: CommandSurface> MessageDriver for CommandDispatchBridge<S> {
    type Inbound = DispatchStream<S>;
    type Error = DispatchError;

    fn attach(&self, outbound: Arc<dyn MessageSource>) -> Result<DispatchStream<S>, DispatchError> {
        CommandDispatchBridge::attach(self, outbound)
    }
}

struct AttachGuard(Arc<AtomicBool>);

impl Drop for AttachGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct HostEvent {
    name: &'static str,
    args: Vec<Value>,
}

enum State {
    Inactive { commands: Arc<dyn MessageSource> },
    Active(Active),
    Closed,
}

struct Active {
    /// `None` once the command bus has closed.
    subscription: Option<Subscription>,
    source: Arc<dyn EventSource>,
    listeners: Vec<(&'static str, ListenerId)>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    pending: FuturesUnordered<Invocation>,
}

/// Host events and call results, as inbound messages.
pub struct DispatchStream<S: CommandSurface> {
    state: State,
    surface: Arc<S>,
    register_event_listeners: bool,
    metrics: Arc<dyn MetricsRecorder>,
    activations: Arc<AtomicU64>,
    guard: Option<AttachGuard>,
}

impl<S: CommandSurface> DispatchStream<S> {
    /// Whether the stream has been polled and not yet closed.
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Whether the command subscription is held.
    pub fn is_subscribed(&self) -> bool {
        match &self.state {
            State::Active(active) => active.subscription.is_some(),
            _ => false,
        }
    }

    /// Host calls still running.
    pub fn pending_invocations(&self) -> usize {
        match &self.state {
            State::Active(active) => active.pending.len(),
            _ => 0,
        }
    }

    /// Event listeners currently registered.
    pub fn listener_count(&self) -> usize {
        match &self.state {
            State::Active(active) => active.listeners.len(),
            _ => 0,
        }
    }

    /// Tear down now instead of on drop. The stream then yields `None`.
    pub fn close(&mut self) {
        self.deactivate();
        self.state = State::Closed;
        self.guard = None;
    }

    fn activate(&mut self) {
        let State::Inactive { commands } = std::mem::replace(&mut self.state, State::Closed) else {
            return;
        };
        let surface = self.surface.name();

        let subscription = commands.subscribe();
        let (sender, events) = mpsc::unbounded_channel();
        let source = self.surface.events();

        let mut listeners = Vec::new();
        if self.register_event_listeners {
            for &name in self.surface.event_names() {
                let sender = sender.clone();
                let id = source.add_listener(
                    name,
                    Arc::new(move |args| {
                        let _ = sender.send(HostEvent { name, args });
                    }),
                );
                listeners.push((name, id));
            }
        }

        let pending: FuturesUnordered<Invocation> =
            self.surface.on_activate().into_iter().collect();

        debug!(
            surface,
            listeners = listeners.len(),
            startup_calls = pending.len(),
            "Dispatch bridge activated"
        );
        self.state = State::Active(Active {
            subscription: Some(subscription),
            source,
            listeners,
            events,
            pending,
        });
        self.activations.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_activation();
    }

    fn deactivate(&mut self) {
        let State::Active(active) = std::mem::replace(&mut self.state, State::Closed) else {
            return;
        };

        for (name, id) in &active.listeners {
            active.source.remove_listener(name, *id);
        }
        let abandoned = active.pending.len();
        drop(active);

        self.metrics.record_deactivation();
        debug!(surface = self.surface.name(), abandoned, "Dispatch bridge deactivated");
    }
}

/// Decode one outbound message and start its host call.
fn dispatch<S: CommandSurface>(
    surface: &S,
    message: Message,
    metrics: &dyn MetricsRecorder,
) -> Option<Invocation> {
    let (name, payload) = message.into_parts();
    match S::Command::decode(&name, ArgList::from_payload(payload)) {
        Ok(Some(command)) => {
            let command_name = command.name();
            trace!(surface = surface.name(), command = command_name, "Dispatching command");
            metrics.record_dispatched(command_name);
            Some(surface.invoke(command))
        }
        Ok(None) => {
            debug!(surface = surface.name(), command = %name, "Ignoring unknown command");
            metrics.record_ignored();
            None
        }
        Err(error) => {
            warn!(surface = surface.name(), command = %name, error = %error, "Dropping command");
            metrics.record_decode_failure();
            None
        }
    }
}

impl<S: CommandSurface> Stream for DispatchStream<S> {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        let this = self.get_mut();
        if matches!(this.state, State::Inactive { .. }) {
            this.activate();
        }

        let State::Active(active) = &mut this.state else {
            return Poll::Ready(None);
        };
        let surface = this.surface.as_ref();
        let metrics = this.metrics.as_ref();

        loop {
            while let Poll::Ready(Some(event)) = active.events.poll_recv(cx) {
                metrics.record_event(event.name);
                match surface.on_event(event.name, event.args) {
                    Reaction::Emit(message) => return Poll::Ready(Some(message)),
                    Reaction::Invoke(invocation) => active.pending.push(invocation),
                    Reaction::Ignore => {}
                }
            }

            while let Poll::Ready(Some((command, result))) = active.pending.poll_next_unpin(cx) {
                match result {
                    Ok(Some(message)) => return Poll::Ready(Some(message)),
                    Ok(None) => trace!(surface = surface.name(), command, "Host call finished"),
                    Err(error) => {
                        warn!(surface = surface.name(), command, error = %error, "Host call failed");
                        metrics.record_invocation_failure(command);
                    }
                }
            }

            let Some(subscription) = active.subscription.as_mut() else {
                return Poll::Pending;
            };
            match subscription.poll_next_unpin(cx) {
                Poll::Ready(Some(message)) => {
                    if let Some(invocation) = dispatch(surface, message, metrics) {
                        active.pending.push(invocation);
                    }
                }
                Poll::Ready(None) => {
                    debug!(surface = surface.name(), "Command bus closed, releasing subscription");
                    active.subscription = None;
                    return Poll::Pending;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<S: CommandSurface> Drop for DispatchStream<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryBrowser;
    use crate::domain::{ALL_WINDOWS, TAB_EVENTS, WINDOW_CREATED};
    use crate::metrics::Metrics;
    use crate::service::{TabSurface, WindowSurface};
    use serde_json::json;
    use shared_bus::MessageBus;
    use std::time::Duration;
    use tokio::time::timeout;

    struct Harness {
        browser: Arc<MemoryBrowser>,
        bus: Arc<MessageBus>,
        metrics: Arc<Metrics>,
    }

    fn harness() -> Harness {
        Harness {
            browser: Arc::new(MemoryBrowser::new()),
            bus: Arc::new(MessageBus::new()),
            metrics: Arc::new(Metrics::new()),
        }
    }

    fn tab_bridge(h: &Harness, config: DispatchConfig) -> CommandDispatchBridge<TabSurface> {
        let surface = TabSurface::new(h.browser.clone(), h.browser.tabs_events());
        CommandDispatchBridge::new(surface, config).with_metrics(h.metrics.clone())
    }

    fn window_bridge(h: &Harness) -> CommandDispatchBridge<WindowSurface> {
        let surface = WindowSurface::new(
            h.browser.clone(),
            h.browser.clone(),
            h.browser.windows_events(),
        );
        CommandDispatchBridge::new(surface, DispatchConfig::default()).with_metrics(h.metrics.clone())
    }

    async fn next<S: CommandSurface>(stream: &mut DispatchStream<S>) -> Message {
        timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
    }

    /// Poll until nothing more is ready.
    fn settle<S: CommandSurface>(stream: &mut DispatchStream<S>) {
        use futures::FutureExt;
        while let Some(Some(_)) = stream.next().now_or_never() {}
    }

    #[tokio::test]
    async fn test_attach_is_cold() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());

        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        assert_eq!(h.bus.subscriber_count(), 0);
        assert_eq!(h.browser.tabs_events().total_listeners(), 0);

        settle(&mut stream);
        assert!(stream.is_subscribed());
        assert_eq!(stream.listener_count(), TAB_EVENTS.len());
        assert_eq!(h.browser.tabs_events().total_listeners(), TAB_EVENTS.len());
    }

    #[tokio::test]
    async fn test_events_become_messages() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        settle(&mut stream);

        h.browser.tabs_events().emit("onActivated", vec![json!({"tabId": 4, "windowId": 1})]);

        let message = next(&mut stream).await;
        assert_eq!(
            message,
            Message::new("onActivated", json!([{"tabId": 4, "windowId": 1}]))
        );
    }

    #[tokio::test]
    async fn test_commands_reach_host() {
        let h = harness();
        h.browser.open_window(None);
        let bridge = tab_bridge(&h, DispatchConfig::commands_only());
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        settle(&mut stream);

        h.bus.send(Message::new("create", json!([{"url": "https://example.org"}])));
        settle(&mut stream);

        assert_eq!(h.browser.tab_count(), 2);
        assert_eq!(h.metrics.snapshot().commands_dispatched, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_commands_are_skipped() {
        let h = harness();
        h.browser.open_window(None);
        let bridge = tab_bridge(&h, DispatchConfig::commands_only());
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        settle(&mut stream);

        h.bus.send(Message::new("explode", json!([])));
        h.bus.send(Message::new("duplicate", json!(["not-an-id"])));
        h.bus.send(Message::new("duplicate", json!([12345])));
        settle(&mut stream);

        let snapshot = h.metrics.snapshot();
        assert_eq!(snapshot.commands_ignored, 1);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.invocation_failures, 1);
        assert!(stream.is_active());
    }

    #[tokio::test]
    async fn test_window_bridge_emits_snapshot_on_activation() {
        let h = harness();
        h.browser.open_window(None);
        let bridge = window_bridge(&h);
        let mut stream = bridge.attach(h.bus.clone()).unwrap();

        let message = next(&mut stream).await;
        assert!(message.is(ALL_WINDOWS));
        assert_eq!(message.payload()[0].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_window_created_event_is_normalized() {
        let h = harness();
        let bridge = window_bridge(&h);
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        let snapshot = next(&mut stream).await;
        assert!(snapshot.is(ALL_WINDOWS));

        h.bus.send(Message::new("create", json!([{"url": "https://example.org"}])));

        let created = next(&mut stream).await;
        assert!(created.is(WINDOW_CREATED));
        assert_eq!(
            created.payload()[0]["tabs"][0]["url"],
            json!("https://example.org")
        );
    }

    #[tokio::test]
    async fn test_drop_removes_listeners_and_subscription() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        settle(&mut stream);

        drop(stream);

        assert_eq!(h.browser.tabs_events().total_listeners(), 0);
        assert_eq!(h.bus.subscriber_count(), 0);
        assert_eq!(h.metrics.snapshot().deactivations, 1);
        assert!(bridge.attach(h.bus.clone()).is_ok());
    }

    #[tokio::test]
    async fn test_sequential_attaches_activate_once_each() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());

        for round in 1..=3 {
            let mut stream = bridge.attach(h.bus.clone()).unwrap();
            settle(&mut stream);
            settle(&mut stream);
            assert_eq!(bridge.activations(), round);
        }
    }

    #[tokio::test]
    async fn test_second_attach_is_rejected() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());
        let _first = bridge.attach(h.bus.clone()).unwrap();

        assert_eq!(
            bridge.attach(h.bus.clone()).err(),
            Some(DispatchError::AlreadyAttached)
        );
    }

    #[tokio::test]
    async fn test_command_bus_close_keeps_events_flowing() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        settle(&mut stream);

        h.bus.close();
        settle(&mut stream);
        assert!(!stream.is_subscribed());

        h.browser.tabs_events().emit("onRemoved", vec![json!(1)]);
        assert!(next(&mut stream).await.is("onRemoved"));
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let h = harness();
        let bridge = tab_bridge(&h, DispatchConfig::default());
        let mut stream = bridge.attach(h.bus.clone()).unwrap();
        settle(&mut stream);

        stream.close();
        assert!(stream.next().await.is_none());
        assert_eq!(h.browser.tabs_events().total_listeners(), 0);
    }
}
