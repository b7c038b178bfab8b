//! # Message Routing Filters
//!
//! Stream adapters that select messages by tag and unwrap their payloads.
//! They are single pass: they consume the stream they are given.

use serde_json::Value;
use shared_types::Message;
use std::pin::Pin;
use tokio_stream::{Stream, StreamExt};

/// Boxed stream of extracted payloads.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

/// Payloads of every message in `stream` tagged `message_type`, in arrival
/// order.
pub fn filter_by_type<S>(stream: S, message_type: impl Into<String>) -> impl Stream<Item = Value>
where
    S: Stream<Item = Message>,
{
    let message_type = message_type.into();
    stream.filter_map(move |message| {
        message
            .is(&message_type)
            .then(|| message.into_payload())
    })
}

/// Follow a hierarchical tag path built by [`shared_types::compose`].
///
/// The first tag is matched against `stream` directly. Each further tag is
/// matched against the previous payload decoded as a message; payloads that
/// are not messages are skipped. An empty path yields every payload.
pub fn filter_by_path<S, T>(stream: S, path: &[T]) -> PayloadStream
where
    S: Stream<Item = Message> + Send + 'static,
    T: AsRef<str>,
{
    let Some((first, rest)) = path.split_first() else {
        return Box::pin(stream.map(Message::into_payload));
    };

    let mut payloads: PayloadStream = Box::pin(filter_by_type(stream, first.as_ref().to_string()));
    for tag in rest {
        let nested = payloads.filter_map(|payload| Message::from_value(payload).ok());
        payloads = Box::pin(filter_by_type(nested, tag.as_ref().to_string()));
    }
    payloads
}
