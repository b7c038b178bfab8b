//! Inbound Ports (Driving Ports)
//!
//! The API applications use to plug an outbound message source into a
//! bridge and get the inbound stream back.

use futures::Stream;
use shared_bus::MessageSource;
use shared_types::Message;
use std::sync::Arc;

/// A bridge between an application message stream and some transport
/// (Driving Port).
///
/// `attach` is cold: nothing is registered on the transport until the
/// returned stream is first polled, and everything is released when it is
/// dropped.
pub trait MessageDriver: Send + Sync {
    /// Stream of messages arriving from the transport.
    type Inbound: Stream<Item = Message> + Send + Unpin;

    /// Why an attach was refused.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Connect `outbound` to the transport and return the inbound stream.
    fn attach(&self, outbound: Arc<dyn MessageSource>) -> Result<Self::Inbound, Self::Error>;
}
