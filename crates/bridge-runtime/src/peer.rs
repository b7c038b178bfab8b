//! # Peer Session
//!
//! One peer bridge: connects to the host, runs ping/pong rounds, then
//! disconnects.
//!
//! A ping sent before the host has registered the new channel is lost, so
//! every round retries until a matching pong arrives.

use futures::StreamExt;
use pc_01_message_bridge::{BridgeConfig, BridgeError, ChannelRuntime, InboundStream, MessageBridge};
use portcast_telemetry::metrics::ROUND_TRIP;
use portcast_telemetry::PrometheusBridgeRecorder;
use serde_json::{json, Value};
use shared_bus::MessageBus;
use shared_types::Message;
use std::sync::Arc;
use std::task::Poll;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::host::{PING, PONG};

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {peer} could not attach: {source}")]
    Attach {
        peer: usize,
        #[source]
        source: BridgeError,
    },

    #[error("peer {peer} lost its inbound stream")]
    Closed { peer: usize },

    #[error("peer {peer} got no pong for round {round} after {attempts} pings")]
    NoReply {
        peer: usize,
        round: usize,
        attempts: usize,
    },
}

/// What one peer achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerReport {
    pub peer: usize,
    pub rounds: usize,
    pub pings_sent: usize,
    pub slowest: Duration,
}

/// A peer bridge with its own outbound bus.
pub struct PeerSession {
    id: usize,
    bridge: MessageBridge,
    outbound: Arc<MessageBus>,
}

impl PeerSession {
    pub fn new(id: usize, runtime: Arc<dyn ChannelRuntime>) -> Self {
        let config = BridgeConfig::peer().with_name(format!("peer-{id}"));
        let outbound = Arc::new(config.outbound_bus());
        let bridge = MessageBridge::new(config, runtime)
            .with_metrics(Arc::new(PrometheusBridgeRecorder::new(format!("peer-{id}"))));
        Self {
            id,
            bridge,
            outbound,
        }
    }

    /// Run `rounds` ping/pong exchanges, then close the channel.
    pub async fn run(
        self,
        rounds: usize,
        reply_timeout: Duration,
        attempts: usize,
    ) -> Result<PeerReport, PeerError> {
        let peer = self.id;
        let mut inbound = self
            .bridge
            .attach(self.outbound.clone())
            .map_err(|source| PeerError::Attach { peer, source })?;

        // First poll connects to the host.
        if let Poll::Ready(None) = futures::poll!(inbound.next()) {
            return Err(PeerError::Closed { peer });
        }
        info!(peer, channels = inbound.channel_count(), "Peer connected");

        let mut report = PeerReport {
            peer,
            rounds: 0,
            pings_sent: 0,
            slowest: Duration::ZERO,
        };

        for round in 0..rounds {
            let started = Instant::now();
            let mut answered = false;

            for attempt in 1..=attempts {
                self.outbound
                    .send(Message::new(PING, json!({"peer": peer, "round": round})));
                report.pings_sent += 1;

                match tokio::time::timeout(reply_timeout, next_pong(&mut inbound, peer, round)).await {
                    Ok(true) => {
                        answered = true;
                        break;
                    }
                    Ok(false) => return Err(PeerError::Closed { peer }),
                    Err(_) => debug!(peer, round, attempt, "No pong yet, retrying"),
                }
            }

            if !answered {
                warn!(peer, round, attempts, "Giving up on round");
                return Err(PeerError::NoReply {
                    peer,
                    round,
                    attempts,
                });
            }

            let elapsed = started.elapsed();
            ROUND_TRIP.observe(elapsed.as_secs_f64());
            report.slowest = report.slowest.max(elapsed);
            report.rounds += 1;
        }

        inbound.close();
        info!(peer, rounds = report.rounds, "Peer finished");
        Ok(report)
    }
}

/// Wait for the pong answering `peer`'s ping for `round`. Returns `false` if
/// the stream ends first.
async fn next_pong(inbound: &mut InboundStream, peer: usize, round: usize) -> bool {
    while let Some(message) = inbound.next().await {
        if message.is(PONG) && answers(message.payload(), peer, round) {
            return true;
        }
    }
    false
}

fn answers(payload: &Value, peer: usize, round: usize) -> bool {
    payload["peer"].as_u64() == Some(peer as u64) && payload["round"].as_u64() == Some(round as u64)
}
