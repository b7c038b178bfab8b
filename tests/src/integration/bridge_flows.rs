//! # Message Bridge Flows
//!
//! Host and peer lifecycles across shared-bus, pc-01-message-bridge and
//! portcast-telemetry.
//!
//! ## Flows Tested:
//!
//! 1. **Peer session**: connect, ping out, pong in, disconnect, sends dropped
//! 2. **Fan-out / fan-in** over several channels with one failing
//! 3. **Host and peers over in-memory channels**
//! 4. **Prometheus recorder** wired into a bridge

#[cfg(test)]
mod tests {
    use futures::{FutureExt, StreamExt};
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use pc_01_message_bridge::test_utils::{RecordingChannel, StubRuntime};
    use pc_01_message_bridge::{
        BridgeConfig, InboundStream, MemoryRuntime, MessageBridge, Metrics,
    };
    use portcast_telemetry::metrics::{CHANNELS_LIVE, MESSAGES_RECEIVED};
    use portcast_telemetry::PrometheusBridgeRecorder;
    use shared_bus::{MessageBus, MessageSource};
    use shared_types::Message;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Poll once without blocking.
    fn poll(stream: &mut InboundStream) -> Option<Option<Message>> {
        stream.next().now_or_never()
    }

    fn host_with_metrics(runtime: Arc<StubRuntime>) -> (MessageBridge, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let bridge = MessageBridge::new(BridgeConfig::host(), runtime).with_metrics(metrics.clone());
        (bridge, metrics)
    }

    // =============================================================================
    // PEER SESSION
    // =============================================================================

    /// A peer connects, exchanges one message each way, and leaves. Sends
    /// after it leaves reach nobody until another peer connects.
    #[test]
    fn test_peer_session_lifecycle() {
        let runtime = StubRuntime::new();
        let bus = Arc::new(MessageBus::new());
        let (bridge, metrics) = host_with_metrics(runtime.clone());

        let mut inbound = bridge.attach(bus.clone()).unwrap();
        poll(&mut inbound);

        // Peer opens a channel: added, subscription acquired
        let peer = RecordingChannel::new();
        runtime.accept(peer.clone());
        poll(&mut inbound);
        assert_eq!(inbound.channel_count(), 1);
        assert_eq!(bus.subscriber_count(), 1);

        // Application pings, peer receives
        assert_eq!(bus.send(Message::new("ping", json!(1))), 1);
        poll(&mut inbound);
        assert_eq!(peer.sent(), vec![Message::new("ping", json!(1))]);

        // Peer pongs, application receives
        peer.emit(Message::new("pong", json!(2)));
        let message = poll(&mut inbound).flatten().unwrap();
        assert_eq!(message, Message::new("pong", json!(2)));

        // Peer disconnects: set empty, subscription released
        peer.close_remote();
        poll(&mut inbound);
        assert_eq!(inbound.channel_count(), 0);
        assert!(!inbound.is_subscribed());
        assert_eq!(bus.subscriber_count(), 0);

        // Nobody is listening now
        assert_eq!(bus.send(Message::new("ping", json!(3))), 0);
        poll(&mut inbound);
        assert_eq!(peer.sent().len(), 1);
        assert_eq!(peer.message_listener_count(), 0);

        // A new peer gets only what is sent after it joined
        let next = RecordingChannel::new();
        runtime.accept(next.clone());
        poll(&mut inbound);
        bus.send(Message::new("ping", json!(4)));
        poll(&mut inbound);
        assert_eq!(next.sent(), vec![Message::new("ping", json!(4))]);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.subscriptions_acquired, 2);
        assert_eq!(snapshot.subscriptions_released, 1);
        assert_eq!(snapshot.messages_received, 1);
    }

    /// One failing channel never stops the broadcast to the others, and
    /// inbound messages keep per-channel order.
    #[test]
    fn test_fan_out_and_fan_in_across_channels() {
        let runtime = StubRuntime::new();
        let bus = Arc::new(MessageBus::new());
        let (bridge, metrics) = host_with_metrics(runtime.clone());
        let mut inbound = bridge.attach(bus.clone()).unwrap();
        poll(&mut inbound);

        let good = RecordingChannel::new();
        let bad = RecordingChannel::failing();
        let other = RecordingChannel::new();
        for channel in [&good, &bad, &other] {
            runtime.accept(channel.clone());
        }
        poll(&mut inbound);
        assert_eq!(inbound.channel_count(), 3);

        bus.send(Message::new("update", json!({"rev": 1})));
        bus.send(Message::new("update", json!({"rev": 2})));
        poll(&mut inbound);

        assert_eq!(good.sent().len(), 2);
        assert_eq!(other.sent().len(), 2);
        assert_eq!(bad.send_attempts(), 2);
        assert_eq!(metrics.snapshot().send_failures, 2);

        good.emit(Message::new("a", json!(1)));
        other.emit(Message::new("b", json!(1)));
        good.emit(Message::new("a", json!(2)));

        let received: Vec<Message> = std::iter::from_fn(|| poll(&mut inbound).flatten()).collect();
        let from_good: Vec<_> = received.iter().filter(|m| m.is("a")).map(|m| m.payload().clone()).collect();
        assert_eq!(received.len(), 3);
        assert_eq!(from_good, vec![json!(1), json!(2)]);
    }

    /// Dropping the inbound stream closes every channel and removes every
    /// listener it registered.
    #[test]
    fn test_drop_tears_down_every_channel() {
        let runtime = StubRuntime::new();
        let bus = Arc::new(MessageBus::new());
        let (bridge, metrics) = host_with_metrics(runtime.clone());
        let mut inbound = bridge.attach(bus.clone()).unwrap();
        poll(&mut inbound);

        let channels: Vec<_> = (0..4).map(|_| RecordingChannel::new()).collect();
        for channel in &channels {
            runtime.accept(channel.clone());
        }
        poll(&mut inbound);
        drop(inbound);

        assert_eq!(runtime.connect_listener_count(), 0);
        assert_eq!(bus.subscriber_count(), 0);
        for channel in &channels {
            assert!(channel.is_disconnected());
            assert_eq!(channel.message_listener_count(), 0);
            assert_eq!(channel.disconnect_listener_count(), 0);
        }
        assert_eq!(metrics.snapshot().deactivations, 1);
        assert_eq!(metrics.live_channels(), 0);
    }

    // =============================================================================
    // IN-MEMORY CHANNELS
    // =============================================================================

    /// Two peers and a host over one memory runtime; a host broadcast
    /// reaches both peers, each peer's message reaches the host.
    #[tokio::test]
    async fn test_host_and_peers_over_memory_channels() {
        let runtime = Arc::new(MemoryRuntime::new());
        let host_bus = Arc::new(MessageBus::new());
        let host = MessageBridge::new(BridgeConfig::host(), runtime.clone());
        let mut host_in = host.attach(host_bus.clone()).unwrap();
        poll(&mut host_in);

        let mut peers = Vec::new();
        for id in 0..2 {
            let bus = Arc::new(MessageBus::new());
            let bridge = MessageBridge::new(
                BridgeConfig::peer().with_name(format!("peer-{id}")),
                runtime.clone(),
            );
            let mut inbound = bridge.attach(bus.clone()).unwrap();
            poll(&mut inbound);
            peers.push((bridge, bus, inbound));
        }
        poll(&mut host_in);
        assert_eq!(host_in.channel_count(), 2);
        assert_eq!(runtime.channels_opened(), 2);

        host_bus.send(Message::new("hello", json!("everyone")));
        poll(&mut host_in);
        for (_, _, inbound) in &mut peers {
            let message = timeout(Duration::from_secs(1), inbound.next())
                .await
                .expect("timeout waiting for broadcast")
                .expect("peer stream ended");
            assert!(message.is("hello"));
        }

        let (_, bus, inbound) = &mut peers[1];
        bus.send(Message::new("reply", json!(1)));
        poll(inbound);
        let reply = timeout(Duration::from_secs(1), host_in.next())
            .await
            .expect("timeout waiting for reply")
            .expect("host stream ended");
        assert_eq!(reply, Message::new("reply", json!(1)));

        peers.clear();
        poll(&mut host_in);
        assert_eq!(host_in.channel_count(), 0);
        assert!(!host_in.is_subscribed());
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[test]
    fn test_prometheus_recorder_tracks_bridge() {
        let runtime = StubRuntime::new();
        let bus = Arc::new(MessageBus::new());
        let recorder = Arc::new(PrometheusBridgeRecorder::new("flow-recorder"));
        let bridge = MessageBridge::new(BridgeConfig::host(), runtime.clone()).with_metrics(recorder);
        let mut inbound = bridge.attach(bus.clone()).unwrap();
        poll(&mut inbound);

        let channel = RecordingChannel::new();
        runtime.accept(channel.clone());
        poll(&mut inbound);
        channel.emit(Message::new("hi", json!(null)));
        poll(&mut inbound);

        assert_eq!(CHANNELS_LIVE.with_label_values(&["flow-recorder"]).get(), 1);
        assert_eq!(MESSAGES_RECEIVED.with_label_values(&["flow-recorder"]).get(), 1);

        drop(inbound);
        assert_eq!(CHANNELS_LIVE.with_label_values(&["flow-recorder"]).get(), 0);
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    proptest! {
        /// Whatever order peers join and leave in, the host is subscribed
        /// exactly while at least one peer is connected.
        #[test]
        fn prop_subscribed_iff_connected(ops in proptest::collection::vec((0usize..4, any::<bool>()), 1..40)) {
            let runtime = StubRuntime::new();
            let bus = Arc::new(MessageBus::new());
            let bridge = MessageBridge::new(BridgeConfig::host(), runtime.clone());
            let mut inbound = bridge.attach(bus.clone()).unwrap();
            poll(&mut inbound);

            let mut slots: Vec<Option<Arc<RecordingChannel>>> = vec![None; 4];
            for (slot, join) in ops {
                match (slots[slot].take(), join) {
                    (None, true) => {
                        let channel = RecordingChannel::new();
                        runtime.accept(channel.clone());
                        slots[slot] = Some(channel);
                    }
                    (Some(channel), false) => channel.close_remote(),
                    (kept, _) => slots[slot] = kept,
                }
                poll(&mut inbound);

                let connected = slots.iter().flatten().count();
                prop_assert_eq!(inbound.channel_count(), connected);
                prop_assert_eq!(inbound.is_subscribed(), connected > 0);
                prop_assert_eq!(bus.subscriber_count(), usize::from(connected > 0));
            }
        }
    }
}
