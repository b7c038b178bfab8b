//! # Message Subscriber
//!
//! Defines the subscription side of the outbound bus.

use shared_types::Message;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was closed.
    #[error("Message bus closed")]
    Closed,
}

/// A subscription handle for receiving outbound messages.
///
/// Holding a `Subscription` is what keeps messages flowing to it; dropping it
/// unsubscribes. Lagging behind the bus capacity loses the oldest messages.
pub struct Subscription {
    /// The broadcast receiver, wrapped for polling.
    stream: BroadcastStream<Message>,

    /// Messages lost because this subscription lagged.
    lagged: u64,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(receiver: broadcast::Receiver<Message>) -> Self {
        Self {
            stream: BroadcastStream::new(receiver),
            lagged: 0,
        }
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Ok(message)` - The next message
    /// - `Err(SubscriptionError::Closed)` - The bus was closed
    pub async fn recv(&mut self) -> Result<Message, SubscriptionError> {
        self.next().await.ok_or(SubscriptionError::Closed)
    }

    /// Total messages skipped because this subscription fell behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(Ok(message))) => return Poll::Ready(Some(message)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    self.lagged += count;
                    warn!(lagged = count, "Subscriber lagged, some messages dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(lagged = self.lagged, "Subscription dropped");
    }
}
