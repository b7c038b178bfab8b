//! # Dispatch Demo
//!
//! Drives the windows and tabs surfaces against an in-memory browser:
//! read the initial window snapshot, open a tab, zoom it, then open a
//! window and check it arrives with its tabs.

use futures::{Stream, StreamExt};
use pc_02_command_dispatch::{
    CommandDispatchBridge, DispatchConfig, DispatchError, MemoryBrowser, TabSurface,
    WindowSurface, ALL_WINDOWS, WINDOW_CREATED,
};
use portcast_telemetry::PrometheusDispatchRecorder;
use serde_json::json;
use shared_types::Message;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("could not attach the {surface} surface: {source}")]
    Attach {
        surface: &'static str,
        #[source]
        source: DispatchError,
    },

    #[error("no {expected} message from the {surface} surface")]
    Missing {
        surface: &'static str,
        expected: &'static str,
    },
}

/// What the dispatch demo observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub windows_at_start: usize,
    pub tabs_at_end: usize,
    pub created_window_tabs: usize,
    pub host_calls: usize,
}

pub async fn run(reply_timeout: Duration) -> Result<DispatchReport, DemoError> {
    let browser = Arc::new(MemoryBrowser::new());
    browser.open_window(Some("about:blank"));

    let window_commands = Arc::new(DispatchConfig::default().outbound_bus());
    let windows = CommandDispatchBridge::new(
        WindowSurface::new(browser.clone(), browser.clone(), browser.windows_events()),
        DispatchConfig::default(),
    )
    .with_metrics(Arc::new(PrometheusDispatchRecorder::new("windows")));

    let tab_commands = Arc::new(DispatchConfig::default().outbound_bus());
    let tabs = CommandDispatchBridge::new(
        TabSurface::new(browser.clone(), browser.tabs_events()),
        DispatchConfig::default(),
    )
    .with_metrics(Arc::new(PrometheusDispatchRecorder::new("tabs")));

    let mut window_stream = windows
        .attach(window_commands.clone())
        .map_err(|source| DemoError::Attach {
            surface: "windows",
            source,
        })?;
    let mut tab_stream = tabs
        .attach(tab_commands.clone())
        .map_err(|source| DemoError::Attach {
            surface: "tabs",
            source,
        })?;

    let snapshot = expect(&mut window_stream, "windows", ALL_WINDOWS, reply_timeout).await?;
    let windows_at_start = snapshot.payload()[0].as_array().map_or(0, Vec::len);
    info!(windows = windows_at_start, "Initial window snapshot");

    // Subscribe the tabs surface before sending it anything.
    if let Poll::Ready(None) = futures::poll!(tab_stream.next()) {
        return Err(DemoError::Missing {
            surface: "tabs",
            expected: "activation",
        });
    }

    tab_commands.send(Message::new("create", json!([{"url": "https://example.org"}])));
    let created = expect(&mut tab_stream, "tabs", "onCreated", reply_timeout).await?;
    let tab = created.payload()[0]["id"].clone();
    info!(tab = %tab, "Tab opened");

    tab_commands.send(Message::new("setZoom", json!([tab, 1.25])));
    expect(&mut tab_stream, "tabs", "onZoomChange", reply_timeout).await?;

    window_commands.send(Message::new("create", json!([{"url": "https://example.com"}])));
    let window = expect(&mut window_stream, "windows", WINDOW_CREATED, reply_timeout).await?;
    let created_window_tabs = window.payload()[0]["tabs"].as_array().map_or(0, Vec::len);
    info!(tabs = created_window_tabs, "Window opened");

    window_stream.close();
    tab_stream.close();

    Ok(DispatchReport {
        windows_at_start,
        tabs_at_end: browser.tab_count(),
        created_window_tabs,
        host_calls: browser.calls().len(),
    })
}

/// Next message tagged `expected`, skipping any others.
async fn expect<S>(
    stream: &mut S,
    surface: &'static str,
    expected: &'static str,
    within: Duration,
) -> Result<Message, DemoError>
where
    S: Stream<Item = Message> + Unpin,
{
    let found = tokio::time::timeout(within, async {
        while let Some(message) = stream.next().await {
            if message.is(expected) {
                return Some(message);
            }
        }
        None
    })
    .await;

    match found {
        Ok(Some(message)) => Ok(message),
        _ => Err(DemoError::Missing { surface, expected }),
    }
}
