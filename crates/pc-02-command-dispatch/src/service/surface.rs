//! The command surface abstraction.
//!
//! A surface binds a command enum to a host API and names the host events it
//! forwards. [`crate::CommandDispatchBridge`] drives any surface the same
//! way; the windows and tabs surfaces differ only in what they implement
//! here.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use shared_types::Message;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::domain::DispatchCommand;
use crate::error::HostError;
use crate::ports::EventSource;

/// A host call in flight.
///
/// Resolves to the message to forward inbound, if any.
pub struct Invocation {
    command: &'static str,
    future: BoxFuture<'static, Result<Option<Message>, HostError>>,
}

impl Invocation {
    pub fn new<F>(command: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<Option<Message>, HostError>> + Send + 'static,
    {
        Self {
            command,
            future: future.boxed(),
        }
    }

    /// A host call whose result is not forwarded.
    pub fn silent<F, T>(command: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<T, HostError>> + Send + 'static,
    {
        Self::new(command, future.map(|result| result.map(|_| None)))
    }

    /// Name of the command or event that started this call.
    pub fn command(&self) -> &'static str {
        self.command
    }
}

impl Future for Invocation {
    type Output = (&'static str, Result<Option<Message>, HostError>);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let command = this.command;
        this.future.as_mut().poll(cx).map(|result| (command, result))
    }
}

/// What to do with one host event.
pub enum Reaction {
    /// Drop it.
    Ignore,
    /// Forward this message now.
    Emit(Message),
    /// Run a host call and forward its result.
    Invoke(Invocation),
}

/// A host API exposed as named commands and events.
pub trait CommandSurface: Send + Sync + 'static {
    type Command: DispatchCommand;

    /// Surface name, for logs.
    fn name(&self) -> &'static str;

    /// Where the surface's events are registered.
    fn events(&self) -> Arc<dyn EventSource>;

    /// Events forwarded while the bridge is active.
    fn event_names(&self) -> &'static [&'static str];

    /// Start the host call for `command`.
    fn invoke(&self, command: Self::Command) -> Invocation;

    /// Turn a host event into an inbound message. By default the message is
    /// tagged with the event name and carries the event arguments.
    fn on_event(&self, event: &'static str, args: Vec<Value>) -> Reaction {
        Reaction::Emit(Message::new(event, Value::Array(args)))
    }

    /// Host calls to run once when the bridge activates.
    fn on_activate(&self) -> Vec<Invocation> {
        Vec::new()
    }
}
