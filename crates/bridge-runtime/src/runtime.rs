//! # Bridge Runtime
//!
//! Wires one host bridge and `peers` peer bridges over a shared in-memory
//! channel runtime, runs the exchanges, and shuts the host down.

use anyhow::{Context, Result};
use pc_01_message_bridge::{BridgeConfig, MemoryRuntime, MessageBridge};
use portcast_telemetry::{bridge_span, PrometheusBridgeRecorder};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, Instrument};

use crate::config::RuntimeConfig;
use crate::dispatch::{self, DispatchReport};
use crate::host::{self, HostReport};
use crate::peer::{PeerReport, PeerSession};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub host: HostReport,
    pub peers: Vec<PeerReport>,
    pub dispatch: Option<DispatchReport>,
}

pub struct BridgeRuntime {
    config: RuntimeConfig,
    channels: Arc<MemoryRuntime>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl BridgeRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            channels: Arc::new(MemoryRuntime::new()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Run every peer to completion, then the dispatch demo if enabled.
    pub async fn run(&self) -> Result<RunReport> {
        info!("===========================================");
        info!("  Portcast Bridge Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("  Peers: {}  Rounds: {}", self.config.peers, self.config.rounds);
        info!("===========================================");

        // Host
        let host_config = BridgeConfig::host();
        let host_outbound = Arc::new(host_config.outbound_bus());
        let host_bridge = MessageBridge::new(host_config, self.channels.clone())
            .with_metrics(Arc::new(PrometheusBridgeRecorder::new("host")));
        let inbound = host_bridge
            .attach(host_outbound.clone())
            .context("Failed to attach host bridge")?;
        let host_task = tokio::spawn(
            host::serve(inbound, host_outbound, self.shutdown_rx.clone())
                .instrument(bridge_span!("host", bridge = "host")),
        );

        // Peers
        let mut peer_tasks = Vec::with_capacity(self.config.peers);
        for id in 0..self.config.peers {
            let session = PeerSession::new(id, self.channels.clone());
            let (rounds, timeout, attempts) = (
                self.config.rounds,
                self.config.reply_timeout,
                self.config.attempts,
            );
            let span = bridge_span!("peer", bridge = %format!("peer-{id}"), peer = id);
            peer_tasks.push(tokio::spawn(
                session.run(rounds, timeout, attempts).instrument(span),
            ));
        }

        let mut peers = Vec::with_capacity(peer_tasks.len());
        let mut failure = None;
        for task in peer_tasks {
            match task.await.context("Peer task panicked")? {
                Ok(report) => peers.push(report),
                Err(e) => {
                    error!(error = %e, "Peer failed");
                    failure.get_or_insert(e);
                }
            }
        }

        let dispatch = if self.config.dispatch_demo {
            Some(
                dispatch::run(self.config.reply_timeout)
                    .await
                    .context("Dispatch demo failed")?,
            )
        } else {
            None
        };

        self.shutdown();
        let host = host_task.await.context("Host task panicked")?;
        info!(
            pings = host.pings_answered,
            peak_channels = host.peak_channels,
            "Host stopped"
        );

        if let Some(e) = failure {
            return Err(e).context("At least one peer failed");
        }

        Ok(RunReport {
            host,
            peers,
            dispatch,
        })
    }

    /// Signal the host loop to stop.
    pub fn shutdown(&self) {
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    }

    /// Channels opened on the shared runtime so far.
    pub fn channels_opened(&self) -> u64 {
        self.channels.channels_opened()
    }
}
