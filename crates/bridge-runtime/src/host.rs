//! # Host Loop
//!
//! Answers every `ping` with a `pong` carrying the same payload. The pong
//! is broadcast to every connected peer; peers pick out their own.

use futures::StreamExt;
use pc_01_message_bridge::InboundStream;
use shared_bus::MessageBus;
use shared_types::Message;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

pub const PING: &str = "ping";
pub const PONG: &str = "pong";

/// What the host saw before it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostReport {
    pub pings_answered: u64,
    pub other_messages: u64,
    pub peak_channels: usize,
    pub channels_at_exit: usize,
}

/// Serve pings until shutdown is signalled or the inbound stream ends.
///
/// Dropping `inbound` on return closes every channel still connected.
pub async fn serve(
    mut inbound: InboundStream,
    outbound: Arc<MessageBus>,
    mut shutdown: watch::Receiver<bool>,
) -> HostReport {
    let mut report = HostReport::default();

    loop {
        tokio::select! {
            next = inbound.next() => {
                let Some(message) = next else {
                    debug!("Host inbound stream ended");
                    break;
                };
                report.peak_channels = report.peak_channels.max(inbound.channel_count());

                if message.is(PING) {
                    let reached = outbound.send(Message::new(PONG, message.into_payload()));
                    report.pings_answered += 1;
                    debug!(reached, "Answered ping");
                } else {
                    report.other_messages += 1;
                    debug!(message_type = message.message_type(), "Ignoring message");
                }
            }
            _ = shutdown.changed() => {
                info!("[host] Shutdown signal received");
                break;
            }
        }
    }

    report.channels_at_exit = inbound.channel_count();
    report
}
