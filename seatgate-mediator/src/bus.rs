//! Message bus capability and an in-process implementation.

use bytes::Bytes;

use seatgate_core::{SeatgateResult, Status};

use crate::subscription::{SubscriberSet, SubscriptionHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl BusMessage {
    /// Payload as text, replacing invalid UTF-8.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Pub/sub bus as consumed by the mediator. Publishing is fire-and-forget.
pub trait MessageBus: Send + Sync {
    fn subscribe(&self, topic: &str) -> SubscriptionHandle<BusMessage>;
    fn publish(&self, topic: &str, payload: Bytes) -> SeatgateResult<()>;
}

/// Simple in-memory bus for tests and single-process deployments.
#[derive(Default)]
pub struct LocalBus {
    subscribers: SubscriberSet<String, BusMessage>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `status` to every subscription on `topic`, ending them.
    pub fn fail_topic(&self, topic: &str, status: Status) -> usize {
        self.subscribers.fail(|t| t == topic, &status)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl MessageBus for LocalBus {
    fn subscribe(&self, topic: &str) -> SubscriptionHandle<BusMessage> {
        self.subscribers.register(topic.to_string(), topic.to_string())
    }

    fn publish(&self, topic: &str, payload: Bytes) -> SeatgateResult<()> {
        let message = BusMessage {
            topic: topic.to_string(),
            payload,
        };
        let delivered = self
            .subscribers
            .deliver(|t| (t == topic).then(|| message.clone()));
        if delivered == 0 {
            tracing::trace!("No subscribers on {}", topic);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_bus_round_trip() {
        let bus = LocalBus::new();
        let mut sub = bus.subscribe("seatadjuster/currentPosition");
        bus.publish("seatadjuster/currentPosition", Bytes::from_static(b"{\"position\":1}"))
            .expect("publish ok");

        let msg = sub.next().await.expect("open").expect("receive ok");
        assert_eq!(msg.topic, "seatadjuster/currentPosition");
        assert_eq!(msg.payload_str(), "{\"position\":1}");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = LocalBus::new();
        assert!(bus.publish("nobody/listens", Bytes::from_static(b"{}")).is_ok());
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = LocalBus::new();
        let mut left = bus.subscribe("left");
        let _right = bus.subscribe("right");

        bus.publish("right", Bytes::from_static(b"r")).unwrap();
        bus.publish("left", Bytes::from_static(b"l")).unwrap();

        let msg = left.next().await.unwrap().unwrap();
        assert_eq!(msg.payload, Bytes::from_static(b"l"));
    }

    #[tokio::test]
    async fn failed_topic_ends_subscription() {
        let bus = LocalBus::new();
        let mut sub = bus.subscribe("seatadjuster/setPosition/request");

        assert_eq!(bus.fail_topic("seatadjuster/setPosition/request", Status::new("connection lost")), 1);
        assert!(matches!(sub.next().await, Some(Err(_))));
        assert!(sub.next().await.is_none());
    }
}
