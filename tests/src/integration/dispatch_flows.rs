//! # Command Dispatch Flows
//!
//! Outbound commands reaching an in-memory browser through the windows and
//! tabs surfaces, and the browser's events coming back as inbound messages.
//!
//! ## Flows Tested:
//!
//! 1. **Tabs**: create, update, move, remove, each answered by its event
//! 2. **Windows**: snapshot on activation, created windows arrive with tabs
//! 3. **Bad commands**: unknown names, malformed arguments and host errors
//!    never end the stream
//! 4. **Commands only**: no event listeners registered

#[cfg(test)]
mod tests {
    use futures::{Stream, StreamExt};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use pc_02_command_dispatch::{
        CommandDispatchBridge, DispatchConfig, EventSource, MemoryBrowser, Metrics, TabSurface,
        WindowSurface, ALL_WINDOWS, TAB_EVENTS, WINDOW_CREATED,
    };
    use shared_bus::{MessageBus, MessageSource};
    use shared_types::Message;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        browser: Arc<MemoryBrowser>,
        commands: Arc<MessageBus>,
        metrics: Arc<Metrics>,
    }

    impl Harness {
        fn new() -> Self {
            let browser = Arc::new(MemoryBrowser::new());
            browser.open_window(Some("about:blank"));
            Self {
                browser,
                commands: Arc::new(MessageBus::new()),
                metrics: Arc::new(Metrics::new()),
            }
        }

        fn tabs(&self, config: DispatchConfig) -> CommandDispatchBridge<TabSurface> {
            CommandDispatchBridge::new(
                TabSurface::new(self.browser.clone(), self.browser.tabs_events()),
                config,
            )
            .with_metrics(self.metrics.clone())
        }

        fn windows(&self) -> CommandDispatchBridge<WindowSurface> {
            CommandDispatchBridge::new(
                WindowSurface::new(
                    self.browser.clone(),
                    self.browser.clone(),
                    self.browser.windows_events(),
                ),
                DispatchConfig::default(),
            )
            .with_metrics(self.metrics.clone())
        }

        fn send(&self, command: &str, args: Value) {
            self.commands.send(Message::new(command, args));
        }

        fn first_tab(&self) -> i64 {
            self.browser
                .tabs_in(pc_02_command_dispatch::WindowId(1))
                .first()
                .and_then(|t| t.id)
                .map(|id| id.0)
                .expect("window 1 has a tab")
        }
    }

    /// Next message tagged `tag`, skipping others.
    async fn next_tagged<S>(stream: &mut S, tag: &str) -> Message
    where
        S: Stream<Item = Message> + Unpin,
    {
        timeout(Duration::from_secs(1), async {
            loop {
                let message = stream.next().await.expect("stream ended");
                if message.is(tag) {
                    return message;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timeout waiting for {tag}"))
    }

    /// Poll until the stream has activated and subscribed.
    async fn activate<S>(stream: &mut S)
    where
        S: Stream<Item = Message> + Unpin,
    {
        let _ = futures::poll!(stream.next());
    }

    // =============================================================================
    // TABS
    // =============================================================================

    #[tokio::test]
    async fn test_tab_lifecycle_round_trip() {
        let h = Harness::new();
        let bridge = h.tabs(DispatchConfig::default());
        let mut events = bridge.attach(h.commands.clone()).unwrap();
        activate(&mut events).await;
        assert_eq!(h.commands.subscriber_count(), 1);

        h.send("create", json!([{"url": "https://example.org"}]));
        let created = next_tagged(&mut events, "onCreated").await;
        let tab = created.payload()[0]["id"].clone();
        assert_eq!(created.payload()[0]["url"], json!("https://example.org"));

        h.send("update", json!([tab, {"url": "https://example.org/next"}]));
        let updated = next_tagged(&mut events, "onUpdated").await;
        assert_eq!(updated.payload()[0], tab);

        h.send("move", json!([tab, {"index": 0}]));
        let moved = next_tagged(&mut events, "onMoved").await;
        assert_eq!(moved.payload()[1]["toIndex"], json!(0));

        h.send("remove", json!([tab]));
        let removed = next_tagged(&mut events, "onRemoved").await;
        assert_eq!(removed.payload()[0], tab);
        assert_eq!(h.browser.tab_count(), 1);

        let calls = h.browser.calls();
        assert_eq!(calls, ["tabs.create", "tabs.update", "tabs.move", "tabs.remove"]);
    }

    #[tokio::test]
    async fn test_remove_accepts_id_list() {
        let h = Harness::new();
        let bridge = h.tabs(DispatchConfig::default());
        let mut events = bridge.attach(h.commands.clone()).unwrap();
        activate(&mut events).await;

        h.send("create", json!([{}]));
        let a = next_tagged(&mut events, "onCreated").await.payload()[0]["id"].clone();
        h.send("create", json!([{}]));
        let b = next_tagged(&mut events, "onCreated").await.payload()[0]["id"].clone();

        h.send("remove", json!([[a, b]]));
        next_tagged(&mut events, "onRemoved").await;
        next_tagged(&mut events, "onRemoved").await;
        assert_eq!(h.browser.tab_count(), 1);
    }

    #[tokio::test]
    async fn test_zoom_without_tab_targets_active_tab() {
        let h = Harness::new();
        let bridge = h.tabs(DispatchConfig::default());
        let mut events = bridge.attach(h.commands.clone()).unwrap();
        activate(&mut events).await;

        h.send("setZoom", json!([2.0]));
        let zoom = next_tagged(&mut events, "onZoomChange").await;

        let active = h.first_tab();
        assert_eq!(zoom.payload()[0]["tabId"], json!(active));
        assert_eq!(
            h.browser.zoom(pc_02_command_dispatch::TabId(active)),
            Some(2.0)
        );
    }

    // =============================================================================
    // WINDOWS
    // =============================================================================

    #[tokio::test]
    async fn test_windows_snapshot_then_created_window() {
        let h = Harness::new();
        let bridge = h.windows();
        let mut events = bridge.attach(h.commands.clone()).unwrap();

        let snapshot = next_tagged(&mut events, ALL_WINDOWS).await;
        let windows = snapshot.payload()[0].as_array().cloned().unwrap_or_default();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0]["tabs"][0]["url"], json!("about:blank"));

        h.send("create", json!([{"url": "https://example.com"}]));
        let created = next_tagged(&mut events, WINDOW_CREATED).await;
        let tabs = created.payload()[0]["tabs"].as_array().cloned().unwrap_or_default();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0]["url"], json!("https://example.com"));
    }

    #[tokio::test]
    async fn test_focus_and_remove_events() {
        let h = Harness::new();
        let bridge = h.windows();
        let mut events = bridge.attach(h.commands.clone()).unwrap();
        next_tagged(&mut events, ALL_WINDOWS).await;

        h.send("create", json!([]));
        next_tagged(&mut events, WINDOW_CREATED).await;

        h.send("update", json!([1, {"focused": true}]));
        let focus = next_tagged(&mut events, "onFocusChanged").await;
        assert_eq!(focus.payload(), &json!([1]));

        h.send("remove", json!([1]));
        let removed = next_tagged(&mut events, "onRemoved").await;
        assert_eq!(removed.payload(), &json!([1]));
        assert_eq!(h.browser.window_count(), 1);
    }

    // =============================================================================
    // BAD COMMANDS
    // =============================================================================

    #[tokio::test]
    async fn test_bad_commands_never_end_the_stream() {
        let h = Harness::new();
        let bridge = h.tabs(DispatchConfig::default());
        let mut events = bridge.attach(h.commands.clone()).unwrap();
        activate(&mut events).await;

        h.send("teleport", json!([1]));
        h.send("duplicate", json!(["not-an-id"]));
        h.send("duplicate", json!([404]));
        h.send("create", json!([{"url": "https://still.working"}]));

        let created = next_tagged(&mut events, "onCreated").await;
        assert_eq!(created.payload()[0]["url"], json!("https://still.working"));

        let snapshot = h.metrics.snapshot();
        assert_eq!(snapshot.commands_ignored, 1);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.invocation_failures, 1);
        assert_eq!(snapshot.commands_dispatched, 2);
    }

    // =============================================================================
    // COMMANDS ONLY
    // =============================================================================

    #[tokio::test]
    async fn test_commands_only_registers_no_listeners() {
        let h = Harness::new();
        let bridge = h.tabs(DispatchConfig::commands_only());
        let mut stream = bridge.attach(h.commands.clone()).unwrap();
        activate(&mut stream).await;

        let registered: usize = TAB_EVENTS
            .iter()
            .map(|event| h.browser.tabs_events().listener_count(event))
            .sum();
        assert_eq!(registered, 0);

        h.send("create", json!([{}]));
        activate(&mut stream).await;
        assert_eq!(h.browser.tab_count(), 2);
    }

    #[tokio::test]
    async fn test_close_releases_listeners_and_subscription() {
        let h = Harness::new();
        let bridge = h.tabs(DispatchConfig::default());
        let mut stream = bridge.attach(h.commands.clone()).unwrap();
        activate(&mut stream).await;
        assert_eq!(h.browser.tabs_events().total_listeners(), TAB_EVENTS.len());

        stream.close();
        assert_eq!(h.browser.tabs_events().total_listeners(), 0);
        assert_eq!(h.commands.subscriber_count(), 0);
        assert!(stream.next().await.is_none());

        // Listeners registered through the port are still independent
        let events: Arc<dyn EventSource> = h.browser.tabs_events();
        let id = events.add_listener("onCreated", Arc::new(|_: Vec<Value>| {}));
        assert!(events.remove_listener("onCreated", id));
    }
}
