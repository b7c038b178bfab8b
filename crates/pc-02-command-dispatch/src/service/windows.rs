//! Windows command surface.
//!
//! Commands: `getAll`, `create`, `remove`, `update`.
//! Events: `onCreated`, `onFocusChanged`, `onRemoved`.
//!
//! The host's window-created event reports a window without its tabs. The
//! surface looks the tabs up and forwards the completed window instead, so
//! consumers always see windows in the same shape. On activation it also
//! emits an `allWindows` snapshot.

use serde_json::{json, Value};
use shared_types::Message;
use std::sync::Arc;
use tracing::{trace, warn};

use super::surface::{CommandSurface, Invocation, Reaction};
use crate::domain::{Window, WindowCommand, ALL_WINDOWS, WINDOW_CREATED, WINDOW_EVENTS};
use crate::error::HostError;
use crate::ports::{EventSource, TabsApi, WindowsApi};

/// Window management exposed as commands and events.
pub struct WindowSurface {
    windows: Arc<dyn WindowsApi>,
    tabs: Arc<dyn TabsApi>,
    events: Arc<dyn EventSource>,
}

impl WindowSurface {
    pub fn new(
        windows: Arc<dyn WindowsApi>,
        tabs: Arc<dyn TabsApi>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            windows,
            tabs,
            events,
        }
    }

    fn snapshot(&self) -> Invocation {
        let windows = Arc::clone(&self.windows);
        Invocation::new("getAll", async move {
            let all = windows.get_all(true).await?;
            trace!(windows = all.len(), "Window snapshot taken");
            Ok(Some(Message::new(ALL_WINDOWS, json!([to_value(&all)?]))))
        })
    }

    fn complete_created(&self, window: Window) -> Reaction {
        let Some(id) = window.id else {
            return Reaction::Emit(created_message(&window));
        };
        let tabs = Arc::clone(&self.tabs);
        Reaction::Invoke(Invocation::new(WINDOW_CREATED, async move {
            let found = tabs.query(Some(id)).await?;
            let window = window.with_tabs(found);
            Ok(Some(Message::new(
                WINDOW_CREATED,
                json!([to_value(&window)?]),
            )))
        }))
    }
}

impl CommandSurface for WindowSurface {
    type Command = WindowCommand;

    fn name(&self) -> &'static str {
        "windows"
    }

    fn events(&self) -> Arc<dyn EventSource> {
        Arc::clone(&self.events)
    }

    fn event_names(&self) -> &'static [&'static str] {
        WINDOW_EVENTS
    }

    fn invoke(&self, command: WindowCommand) -> Invocation {
        let windows = Arc::clone(&self.windows);
        match command {
            WindowCommand::GetAll => self.snapshot(),
            WindowCommand::Create { data } => {
                Invocation::silent("create", async move { windows.create(data).await })
            }
            WindowCommand::Remove { window } => {
                Invocation::silent("remove", async move { windows.remove(window).await })
            }
            WindowCommand::Update { window, info } => {
                Invocation::silent("update", async move { windows.update(window, info).await })
            }
        }
    }

    fn on_event(&self, event: &'static str, args: Vec<Value>) -> Reaction {
        if event != WINDOW_CREATED {
            return Reaction::Emit(Message::new(event, Value::Array(args)));
        }

        let raw = args.into_iter().next().unwrap_or(Value::Null);
        match serde_json::from_value::<Window>(raw.clone()) {
            Ok(window) => self.complete_created(window),
            Err(error) => {
                warn!(error = %error, "Unrecognised window in created event, forwarding as is");
                Reaction::Emit(Message::new(WINDOW_CREATED, Value::Array(vec![raw])))
            }
        }
    }

    fn on_activate(&self) -> Vec<Invocation> {
        vec![self.snapshot()]
    }
}

fn created_message(window: &Window) -> Message {
    let value = serde_json::to_value(window).unwrap_or(Value::Null);
    Message::new(WINDOW_CREATED, Value::Array(vec![value]))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, HostError> {
    serde_json::to_value(value).map_err(|e| HostError::Malformed(e.to_string()))
}
