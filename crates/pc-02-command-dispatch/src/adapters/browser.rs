//! In-memory browser.
//!
//! Implements [`WindowsApi`] and [`TabsApi`] over plain vectors and fires the
//! matching window and tab events, so the dispatch bridge can be exercised
//! end to end without a real host. Every API call is recorded by name.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use super::event_source::MemoryEventSource;
use crate::domain::{Tab, TabId, Window, WindowId};
use crate::error::HostError;
use crate::ports::{TabsApi, WindowsApi};

/// Window id reported when focus leaves every window.
const WINDOW_ID_NONE: i64 = -1;

#[derive(Clone, Copy)]
enum Registry {
    Windows,
    Tabs,
}

/// Events raised by one call, fired once the state lock is released.
type Outbox = Vec<(Registry, &'static str, Vec<Value>)>;

#[derive(Default)]
struct BrowserState {
    windows: Vec<Window>,
    tabs: Vec<Tab>,
    zoom: HashMap<TabId, f64>,
    next_window: i64,
    next_tab: i64,
}

impl BrowserState {
    fn window_pos(&self, id: WindowId) -> Result<usize, HostError> {
        self.windows
            .iter()
            .position(|w| w.id == Some(id))
            .ok_or(HostError::window_not_found(id.0))
    }

    fn tab_pos(&self, id: TabId) -> Result<usize, HostError> {
        self.tabs
            .iter()
            .position(|t| t.id == Some(id))
            .ok_or(HostError::tab_not_found(id.0))
    }

    /// The given tab, or the active tab of the focused window.
    fn resolve(&self, tab: Option<TabId>) -> Result<usize, HostError> {
        if let Some(id) = tab {
            return self.tab_pos(id);
        }
        let focused = self.windows.iter().find(|w| w.focused).and_then(|w| w.id);
        self.tabs
            .iter()
            .position(|t| t.active && (focused.is_none() || t.window_id == focused))
            .ok_or_else(|| HostError::Rejected("no active tab".to_string()))
    }

    fn tabs_of(&self, window: WindowId) -> Vec<Tab> {
        let mut tabs: Vec<Tab> = self
            .tabs
            .iter()
            .filter(|t| t.window_id == Some(window))
            .cloned()
            .collect();
        tabs.sort_by_key(|t| t.index);
        tabs
    }

    fn focus(&mut self, window: Option<WindowId>) {
        for w in &mut self.windows {
            w.focused = w.id.is_some() && w.id == window;
        }
    }

    fn open_window(&mut self, url: Option<String>, focused: bool) -> (Window, Tab) {
        self.next_window += 1;
        let id = WindowId(self.next_window);
        self.windows.push(Window::new(id));
        if focused {
            self.focus(Some(id));
        }
        let tab = self.open_tab(id, url, true);
        let pos = self.windows.len() - 1;
        (self.windows[pos].clone(), tab)
    }

    fn open_tab(&mut self, window: WindowId, url: Option<String>, active: bool) -> Tab {
        self.next_tab += 1;
        let mut tab = Tab::new(TabId(self.next_tab), window);
        tab.url = url;
        tab.index = self.tabs_of(window).len() as u32;
        if active {
            self.activate(window, tab.id);
            tab.active = true;
        }
        self.tabs.push(tab.clone());
        tab
    }

    fn activate(&mut self, window: WindowId, tab: Option<TabId>) {
        for t in &mut self.tabs {
            if t.window_id == Some(window) {
                t.active = t.id == tab;
            }
        }
    }

    /// Put `tab` at `index` in `window` (end of the strip when `None`).
    fn place(&mut self, tab: TabId, window: WindowId, index: Option<usize>) -> u32 {
        let mut order: Vec<TabId> = self
            .tabs_of(window)
            .into_iter()
            .filter_map(|t| t.id)
            .filter(|id| *id != tab)
            .collect();
        let at = index.map_or(order.len(), |i| i.min(order.len()));
        order.insert(at, tab);

        for t in &mut self.tabs {
            if t.id == Some(tab) {
                t.window_id = Some(window);
            }
        }
        self.reindex(window, &order);
        at as u32
    }

    fn reindex(&mut self, window: WindowId, order: &[TabId]) {
        for t in &mut self.tabs {
            if t.window_id != Some(window) {
                continue;
            }
            if let Some(i) = order.iter().position(|id| Some(*id) == t.id) {
                t.index = i as u32;
            }
        }
    }

    fn compact(&mut self, window: WindowId) {
        let order: Vec<TabId> = self.tabs_of(window).into_iter().filter_map(|t| t.id).collect();
        self.reindex(window, &order);
    }
}

/// A browser that lives entirely in memory.
pub struct MemoryBrowser {
    state: Mutex<BrowserState>,
    windows_events: Arc<MemoryEventSource>,
    tabs_events: Arc<MemoryEventSource>,
    calls: Mutex<Vec<String>>,
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState::default()),
            windows_events: Arc::new(MemoryEventSource::new()),
            tabs_events: Arc::new(MemoryEventSource::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Registry for window events.
    pub fn windows_events(&self) -> Arc<MemoryEventSource> {
        Arc::clone(&self.windows_events)
    }

    /// Registry for tab events.
    pub fn tabs_events(&self) -> Arc<MemoryEventSource> {
        Arc::clone(&self.tabs_events)
    }

    /// Open a focused window with one tab, as a user would.
    pub fn open_window(&self, url: Option<&str>) -> Window {
        let (window, tab) = self.state.lock().open_window(url.map(str::to_string), true);
        self.fire(created_events(&window, &tab));
        window
    }

    /// Tabs of `window` in strip order.
    pub fn tabs_in(&self, window: WindowId) -> Vec<Tab> {
        self.state.lock().tabs_of(window)
    }

    pub fn tab_count(&self) -> usize {
        self.state.lock().tabs.len()
    }

    pub fn window_count(&self) -> usize {
        self.state.lock().windows.len()
    }

    /// Zoom factor last set on `tab`.
    pub fn zoom(&self, tab: TabId) -> Option<f64> {
        self.state.lock().zoom.get(&tab).copied()
    }

    /// Every API call so far, as `"windows.create"`, `"tabs.reload"`, ...
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &str) {
        trace!(call, "Host API call");
        self.calls.lock().push(call.to_string());
    }

    fn fire(&self, outbox: Outbox) {
        for (registry, event, args) in outbox {
            match registry {
                Registry::Windows => self.windows_events.emit(event, args),
                Registry::Tabs => self.tabs_events.emit(event, args),
            };
        }
    }
}

fn created_events(window: &Window, tab: &Tab) -> Outbox {
    vec![
        (Registry::Windows, "onCreated", vec![value(window)]),
        (Registry::Tabs, "onCreated", vec![value(tab)]),
    ]
}

fn value<T: serde::Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

fn tab_id(tab: &Tab) -> Value {
    json!(tab.id.map(|id| id.0))
}

#[async_trait]
impl WindowsApi for MemoryBrowser {
    async fn get_all(&self, populate: bool) -> Result<Vec<Window>, HostError> {
        self.record("windows.getAll");
        let state = self.state.lock();
        let windows = state
            .windows
            .iter()
            .map(|w| match (populate, w.id) {
                (true, Some(id)) => w.clone().with_tabs(state.tabs_of(id)),
                _ => w.clone(),
            })
            .collect();
        Ok(windows)
    }

    async fn create(&self, data: Option<Value>) -> Result<Window, HostError> {
        self.record("windows.create");
        let data = data.unwrap_or(Value::Null);
        let url = data.get("url").and_then(Value::as_str).map(str::to_string);
        let focused = data.get("focused").and_then(Value::as_bool).unwrap_or(true);

        let (window, tab) = self.state.lock().open_window(url, focused);
        self.fire(created_events(&window, &tab));
        Ok(window.with_tabs(vec![tab]))
    }

    async fn remove(&self, window: WindowId) -> Result<(), HostError> {
        self.record("windows.remove");
        let mut outbox = Outbox::new();
        {
            let mut state = self.state.lock();
            let pos = state.window_pos(window)?;
            state.windows.remove(pos);
            for tab in state.tabs_of(window) {
                outbox.push((
                    Registry::Tabs,
                    "onRemoved",
                    vec![tab_id(&tab), json!({"windowId": window.0, "isWindowClosing": true})],
                ));
            }
            state.tabs.retain(|t| t.window_id != Some(window));
        }
        outbox.push((Registry::Windows, "onRemoved", vec![json!(window.0)]));
        self.fire(outbox);
        Ok(())
    }

    async fn update(&self, window: WindowId, info: Value) -> Result<Window, HostError> {
        self.record("windows.update");
        let mut outbox = Outbox::new();
        let updated = {
            let mut state = self.state.lock();
            let pos = state.window_pos(window)?;
            match info.get("focused").and_then(Value::as_bool) {
                Some(true) => {
                    state.focus(Some(window));
                    outbox.push((Registry::Windows, "onFocusChanged", vec![json!(window.0)]));
                }
                Some(false) => {
                    state.focus(None);
                    outbox.push((Registry::Windows, "onFocusChanged", vec![json!(WINDOW_ID_NONE)]));
                }
                None => {}
            }
            if let Value::Object(fields) = info {
                let extra: Map<String, Value> =
                    fields.into_iter().filter(|(k, _)| k != "focused").collect();
                state.windows[pos].extra.extend(extra);
            }
            state.windows[pos].clone()
        };
        self.fire(outbox);
        Ok(updated)
    }
}

#[async_trait]
impl TabsApi for MemoryBrowser {
    async fn query(&self, window: Option<WindowId>) -> Result<Vec<Tab>, HostError> {
        self.record("tabs.query");
        let state = self.state.lock();
        Ok(match window {
            Some(id) => state.tabs_of(id),
            None => state.tabs.clone(),
        })
    }

    async fn connect(&self, tab: TabId, _info: Option<Value>) -> Result<(), HostError> {
        self.record("tabs.connect");
        self.state.lock().tab_pos(tab).map(|_| ())
    }

    async fn send_message(
        &self,
        tab: TabId,
        message: Value,
        _options: Option<Value>,
    ) -> Result<Value, HostError> {
        self.record("tabs.sendMessage");
        self.state.lock().tab_pos(tab)?;
        Ok(message)
    }

    async fn create(&self, properties: Value) -> Result<Tab, HostError> {
        self.record("tabs.create");
        let url = properties.get("url").and_then(Value::as_str).map(str::to_string);
        let active = properties.get("active").and_then(Value::as_bool).unwrap_or(true);

        let tab = {
            let mut state = self.state.lock();
            let window = match properties.get("windowId").and_then(Value::as_i64) {
                Some(id) => WindowId(id),
                None => state
                    .windows
                    .iter()
                    .find(|w| w.focused)
                    .or_else(|| state.windows.first())
                    .and_then(|w| w.id)
                    .ok_or_else(|| HostError::Unavailable("no window to open a tab in".to_string()))?,
            };
            state.window_pos(window)?;
            state.open_tab(window, url, active)
        };

        let mut outbox = vec![(Registry::Tabs, "onCreated", vec![value(&tab)])];
        if active {
            outbox.push((
                Registry::Tabs,
                "onActivated",
                vec![json!({"tabId": tab_id(&tab), "windowId": tab.window_id.map(|w| w.0)})],
            ));
        }
        self.fire(outbox);
        Ok(tab)
    }

    async fn duplicate(&self, tab: TabId) -> Result<Tab, HostError> {
        self.record("tabs.duplicate");
        let copy = {
            let mut state = self.state.lock();
            let pos = state.tab_pos(tab)?;
            let source = state.tabs[pos].clone();
            let window = source
                .window_id
                .ok_or_else(|| HostError::Rejected("tab has no window".to_string()))?;
            state.open_tab(window, source.url, true)
        };
        self.fire(vec![(Registry::Tabs, "onCreated", vec![value(&copy)])]);
        Ok(copy)
    }

    async fn update(&self, tab: Option<TabId>, properties: Value) -> Result<Tab, HostError> {
        self.record("tabs.update");
        let updated = {
            let mut state = self.state.lock();
            let pos = state.resolve(tab)?;
            if let Some(url) = properties.get("url").and_then(Value::as_str) {
                state.tabs[pos].url = Some(url.to_string());
            }
            if properties.get("active").and_then(Value::as_bool) == Some(true) {
                let (window, id) = (state.tabs[pos].window_id, state.tabs[pos].id);
                if let Some(window) = window {
                    state.activate(window, id);
                }
            }
            state.tabs[pos].clone()
        };
        self.fire(vec![(
            Registry::Tabs,
            "onUpdated",
            vec![tab_id(&updated), properties, value(&updated)],
        )]);
        Ok(updated)
    }

    async fn move_tabs(&self, tabs: Vec<TabId>, properties: Value) -> Result<Vec<Tab>, HostError> {
        self.record("tabs.move");
        let index = properties
            .get("index")
            .and_then(Value::as_i64)
            .and_then(|i| usize::try_from(i).ok());
        let target = properties.get("windowId").and_then(Value::as_i64).map(WindowId);

        let mut outbox = Outbox::new();
        let moved = {
            let mut state = self.state.lock();
            for id in &tabs {
                state.tab_pos(*id)?;
            }
            if let Some(window) = target {
                state.window_pos(window)?;
            }

            let mut moved = Vec::with_capacity(tabs.len());
            for (offset, id) in tabs.iter().enumerate() {
                let pos = state.tab_pos(*id)?;
                let (from_window, from_index) = (state.tabs[pos].window_id, state.tabs[pos].index);
                let Some(from_window) = from_window else {
                    continue;
                };
                let window = target.unwrap_or(from_window);
                let to_index = state.place(*id, window, index.map(|i| i + offset));

                if window == from_window {
                    outbox.push((
                        Registry::Tabs,
                        "onMoved",
                        vec![
                            json!(id.0),
                            json!({"windowId": window.0, "fromIndex": from_index, "toIndex": to_index}),
                        ],
                    ));
                } else {
                    state.compact(from_window);
                    outbox.push((
                        Registry::Tabs,
                        "onDetached",
                        vec![json!(id.0), json!({"oldWindowId": from_window.0, "oldPosition": from_index})],
                    ));
                    outbox.push((
                        Registry::Tabs,
                        "onAttached",
                        vec![json!(id.0), json!({"newWindowId": window.0, "newPosition": to_index})],
                    ));
                }
                let pos = state.tab_pos(*id)?;
                moved.push(state.tabs[pos].clone());
            }
            moved
        };
        self.fire(outbox);
        Ok(moved)
    }

    async fn reload(&self, tab: Option<TabId>, _properties: Option<Value>) -> Result<(), HostError> {
        self.record("tabs.reload");
        self.state.lock().resolve(tab).map(|_| ())
    }

    async fn remove(&self, tabs: Vec<TabId>) -> Result<(), HostError> {
        self.record("tabs.remove");
        let mut outbox = Outbox::new();
        {
            let mut state = self.state.lock();
            for id in &tabs {
                state.tab_pos(*id)?;
            }
            for id in &tabs {
                let pos = state.tab_pos(*id)?;
                let removed = state.tabs.remove(pos);
                state.zoom.remove(id);
                if let Some(window) = removed.window_id {
                    state.compact(window);
                }
                outbox.push((
                    Registry::Tabs,
                    "onRemoved",
                    vec![
                        json!(id.0),
                        json!({"windowId": removed.window_id.map(|w| w.0), "isWindowClosing": false}),
                    ],
                ));
            }
        }
        self.fire(outbox);
        Ok(())
    }

    async fn execute_script(
        &self,
        tab: Option<TabId>,
        _details: Value,
    ) -> Result<Vec<Value>, HostError> {
        self.record("tabs.executeScript");
        self.state.lock().resolve(tab)?;
        Ok(vec![Value::Null])
    }

    async fn insert_css(&self, tab: Option<TabId>, _details: Value) -> Result<(), HostError> {
        self.record("tabs.insertCSS");
        self.state.lock().resolve(tab).map(|_| ())
    }

    async fn set_zoom(&self, tab: Option<TabId>, factor: f64) -> Result<(), HostError> {
        self.record("tabs.setZoom");
        let (id, old) = {
            let mut state = self.state.lock();
            let pos = state.resolve(tab)?;
            let id = state.tabs[pos]
                .id
                .ok_or_else(|| HostError::Rejected("tab has no id".to_string()))?;
            let old = state.zoom.insert(id, factor).unwrap_or(1.0);
            (id, old)
        };
        self.fire(vec![(
            Registry::Tabs,
            "onZoomChange",
            vec![json!({"tabId": id.0, "oldZoomFactor": old, "newZoomFactor": factor})],
        )]);
        Ok(())
    }

    async fn set_zoom_settings(&self, tab: Option<TabId>, settings: Value) -> Result<(), HostError> {
        self.record("tabs.setZoomSettings");
        let mut state = self.state.lock();
        let pos = state.resolve(tab)?;
        state.tabs[pos].extra.insert("zoomSettings".to_string(), settings);
        Ok(())
    }
}
