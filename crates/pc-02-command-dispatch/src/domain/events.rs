//! Message types produced by the command surfaces.

/// Snapshot of every window, emitted on activation and in reply to `getAll`.
pub const ALL_WINDOWS: &str = "allWindows";

/// Window events forwarded as inbound messages.
pub const WINDOW_EVENTS: &[&str] = &["onCreated", "onFocusChanged", "onRemoved"];

/// The window event whose payload is completed with the window's tabs.
pub const WINDOW_CREATED: &str = "onCreated";

/// Tab events forwarded as inbound messages.
pub const TAB_EVENTS: &[&str] = &[
    "onCreated",
    "onUpdated",
    "onMoved",
    "onSelectionChanged",
    "onActiveChanged",
    "onActivated",
    "onHighlightChanged",
    "onHighlighted",
    "onDetached",
    "onAttached",
    "onRemoved",
    "onReplaced",
    "onZoomChange",
];
