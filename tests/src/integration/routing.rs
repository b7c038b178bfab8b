//! # Routing Flows
//!
//! Hierarchical tags built with `compose` travel through a bridge and are
//! unwrapped again with `filter_by_path` on the other side.

#[cfg(test)]
mod tests {
    use futures::{FutureExt, StreamExt};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use pc_01_message_bridge::test_utils::{RecordingChannel, StubRuntime};
    use pc_01_message_bridge::{BridgeConfig, MessageBridge};
    use shared_bus::{filter_by_path, filter_by_type, MessageBus};
    use shared_types::{compose, Message, MessageError};

    #[tokio::test]
    async fn test_nested_reply_routed_by_path() {
        let runtime = StubRuntime::new();
        let bridge = MessageBridge::new(BridgeConfig::host(), runtime.clone());
        let mut inbound = bridge.attach(Arc::new(MessageBus::new())).unwrap();
        let _ = inbound.next().now_or_never();

        let channel = RecordingChannel::new();
        runtime.accept(channel.clone());
        let _ = inbound.next().now_or_never();

        channel.emit(compose(&["tabs", "status"], json!("loading")).unwrap());
        channel.emit(compose(&["windows", "status"], json!("ignored")).unwrap());
        channel.emit(Message::new("tabs", json!("not a message")));
        channel.emit(compose(&["tabs", "status"], json!("complete")).unwrap());

        let mut statuses = filter_by_path(inbound, &["tabs", "status"]);
        let mut seen = Vec::new();
        for _ in 0..2 {
            let payload = timeout(Duration::from_secs(1), statuses.next())
                .await
                .expect("timeout waiting for status")
                .expect("stream ended");
            seen.push(payload);
        }
        assert_eq!(seen, vec![json!("loading"), json!("complete")]);
    }

    #[tokio::test]
    async fn test_type_filter_over_outbound_bus() {
        let bus = MessageBus::new();
        let subscription = shared_bus::MessageSource::subscribe(&bus);
        let mut pongs = Box::pin(filter_by_type(subscription, "pong"));

        bus.send(Message::new("ping", json!(1)));
        bus.send(Message::new("pong", json!(2)));

        let payload = timeout(Duration::from_secs(1), pongs.next())
            .await
            .expect("timeout waiting for pong");
        assert_eq!(payload, Some(json!(2)));
    }

    #[test]
    fn test_compose_rejects_empty_path() {
        let empty: [&str; 0] = [];
        assert_eq!(
            compose(&empty, json!(null)),
            Err(MessageError::EmptyTypeSequence)
        );
    }

    #[test]
    fn test_compose_nests_outermost_first() {
        let message = compose(&["a", "b", "c"], json!(42)).unwrap();
        assert!(message.is("a"));

        let inner = Message::from_value(message.into_payload()).unwrap();
        assert!(inner.is("b"));
        let innermost = Message::from_value(inner.into_payload()).unwrap();
        assert_eq!(innermost, Message::new("c", json!(42)));
    }
}
