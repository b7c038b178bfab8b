//! Host-side window and tab records.
//!
//! Only the fields the dispatch layer reads are typed. Everything else the
//! host reports is kept in `extra` and survives a round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Host window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Host tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// A host window.
///
/// `tabs` is only present when the host was asked to populate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WindowId>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<Tab>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Window {
    pub fn new(id: WindowId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Copy of this window with `tabs` filled in.
    pub fn with_tabs(mut self, tabs: Vec<Tab>) -> Self {
        self.tabs = Some(tabs);
        self
    }
}

/// A host tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tab {
    pub fn new(id: TabId, window_id: WindowId) -> Self {
        Self {
            id: Some(id),
            window_id: Some(window_id),
            ..Self::default()
        }
    }
}
