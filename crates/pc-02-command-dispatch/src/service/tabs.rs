//! Tabs command surface.
//!
//! Every tab command maps one-to-one onto a [`TabsApi`] call; results are
//! not forwarded. All thirteen tab events are forwarded unchanged.

use std::sync::Arc;

use super::surface::{CommandSurface, Invocation};
use crate::domain::{DispatchCommand, TabCommand, TAB_EVENTS};
use crate::ports::{EventSource, TabsApi};

/// Tab management exposed as commands and events.
pub struct TabSurface {
    tabs: Arc<dyn TabsApi>,
    events: Arc<dyn EventSource>,
}

impl TabSurface {
    pub fn new(tabs: Arc<dyn TabsApi>, events: Arc<dyn EventSource>) -> Self {
        Self { tabs, events }
    }
}

impl CommandSurface for TabSurface {
    type Command = TabCommand;

    fn name(&self) -> &'static str {
        "tabs"
    }

    fn events(&self) -> Arc<dyn EventSource> {
        Arc::clone(&self.events)
    }

    fn event_names(&self) -> &'static [&'static str] {
        TAB_EVENTS
    }

    fn invoke(&self, command: TabCommand) -> Invocation {
        let api = Arc::clone(&self.tabs);
        let name = command.name();
        match command {
            TabCommand::Connect { tab, info } => {
                Invocation::silent(name, async move { api.connect(tab, info).await })
            }
            TabCommand::SendMessage {
                tab,
                message,
                options,
            } => Invocation::silent(name, async move {
                api.send_message(tab, message, options).await
            }),
            TabCommand::Create { properties } => {
                Invocation::silent(name, async move { api.create(properties).await })
            }
            TabCommand::Duplicate { tab } => {
                Invocation::silent(name, async move { api.duplicate(tab).await })
            }
            TabCommand::Update { tab, properties } => {
                Invocation::silent(name, async move { api.update(tab, properties).await })
            }
            TabCommand::Move { tabs, properties } => {
                Invocation::silent(name, async move { api.move_tabs(tabs, properties).await })
            }
            TabCommand::Reload { tab, properties } => {
                Invocation::silent(name, async move { api.reload(tab, properties).await })
            }
            TabCommand::Remove { tabs } => {
                Invocation::silent(name, async move { api.remove(tabs).await })
            }
            TabCommand::ExecuteScript { tab, details } => {
                Invocation::silent(name, async move { api.execute_script(tab, details).await })
            }
            TabCommand::InsertCss { tab, details } => {
                Invocation::silent(name, async move { api.insert_css(tab, details).await })
            }
            TabCommand::SetZoom { tab, factor } => {
                Invocation::silent(name, async move { api.set_zoom(tab, factor).await })
            }
            TabCommand::SetZoomSettings { tab, settings } => Invocation::silent(name, async move {
                api.set_zoom_settings(tab, settings).await
            }),
        }
    }
}
