//! Outbound Ports (Driven Ports)
//!
//! The host API a command surface drives and the event registry it listens
//! on. Implementations wrap whatever the host actually offers.

use async_trait::async_trait;
use pc_01_message_bridge::ListenerId;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{Tab, TabId, Window, WindowId};
use crate::error::HostError;

/// Callback for a host event. Receives the event's positional arguments.
pub type EventListener = Arc<dyn Fn(Vec<Value>) + Send + Sync>;

/// Named host events (Driven Port).
pub trait EventSource: Send + Sync {
    /// Register `listener` for `event`.
    fn add_listener(&self, event: &str, listener: EventListener) -> ListenerId;

    /// Deregister a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, event: &str, id: ListenerId) -> bool;
}

/// Host window management (Driven Port).
#[async_trait]
pub trait WindowsApi: Send + Sync {
    /// Every window; with `populate` each carries its tabs.
    async fn get_all(&self, populate: bool) -> Result<Vec<Window>, HostError>;

    async fn create(&self, data: Option<Value>) -> Result<Window, HostError>;

    async fn remove(&self, window: WindowId) -> Result<(), HostError>;

    async fn update(&self, window: WindowId, info: Value) -> Result<Window, HostError>;
}

/// Host tab management (Driven Port).
///
/// An absent tab id means the active tab of the current window.
#[async_trait]
pub trait TabsApi: Send + Sync {
    /// Tabs of one window, or of every window.
    async fn query(&self, window: Option<WindowId>) -> Result<Vec<Tab>, HostError>;

    async fn connect(&self, tab: TabId, info: Option<Value>) -> Result<(), HostError>;

    async fn send_message(
        &self,
        tab: TabId,
        message: Value,
        options: Option<Value>,
    ) -> Result<Value, HostError>;

    async fn create(&self, properties: Value) -> Result<Tab, HostError>;

    async fn duplicate(&self, tab: TabId) -> Result<Tab, HostError>;

    async fn update(&self, tab: Option<TabId>, properties: Value) -> Result<Tab, HostError>;

    async fn move_tabs(&self, tabs: Vec<TabId>, properties: Value) -> Result<Vec<Tab>, HostError>;

    async fn reload(&self, tab: Option<TabId>, properties: Option<Value>) -> Result<(), HostError>;

    async fn remove(&self, tabs: Vec<TabId>) -> Result<(), HostError>;

    async fn execute_script(&self, tab: Option<TabId>, details: Value)
        -> Result<Vec<Value>, HostError>;

    async fn insert_css(&self, tab: Option<TabId>, details: Value) -> Result<(), HostError>;

    async fn set_zoom(&self, tab: Option<TabId>, factor: f64) -> Result<(), HostError>;

    async fn set_zoom_settings(&self, tab: Option<TabId>, settings: Value)
        -> Result<(), HostError>;
}
