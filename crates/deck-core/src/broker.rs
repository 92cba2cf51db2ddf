//! Notification fabric: per-organization, per-resource pub/sub channels.
//!
//! A publish carries only an opaque token (the changed storage key or an
//! event id), never a payload. Subscribers re-read current state on receipt,
//! so a delivered notification always reflects latest-committed state.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tokio::sync::RwLock;

/// Global channel every ingested event id is published on, regardless of
/// organization. The execution runtime listens here.
pub const GLOBAL_EVENTS_CHANNEL: &str = "events";

pub fn org_events_channel(organization_id: &str) -> String {
    format!("organization.{organization_id}.events")
}

pub fn org_event_channel(organization_id: &str, event_id: &str) -> String {
    format!("organization.{organization_id}.event.{event_id}")
}

pub fn org_storage_channel(organization_id: &str) -> String {
    format!("organization.{organization_id}.storage")
}

/// One live cursor into a channel. Dropping it unsubscribes; after the drop
/// no token can reach the holder, so no further store reads happen on its
/// behalf.
pub struct Subscription {
    rx: broadcast::Receiver<String>,
}

impl Subscription {
    /// Next token, or `None` when the subscription is over. A lagged receiver
    /// (consumer slower than the publish rate) is over: the policy is to drop
    /// the slow consumer, not to buffer without bound.
    pub async fn recv(&mut self) -> Option<String> {
        match self.rx.recv().await {
            Ok(token) => Some(token),
            Err(broadcast::error::RecvError::Closed)
            | Err(broadcast::error::RecvError::Lagged(_)) => None,
        }
    }
}

#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, channel: &str, token: &str);
    async fn subscribe(&self, channel: &str) -> Subscription;
}

// ---------------------------------------------------------------------------
// InProcessBroker
// ---------------------------------------------------------------------------

const CHANNEL_CAPACITY: usize = 64;

/// Broker backed by one bounded `broadcast` channel per channel name.
#[derive(Default)]
pub struct InProcessBroker {
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for InProcessBroker {
    async fn publish(&self, channel: &str, token: &str) {
        let mut channels = self.channels.write().await;
        if let Some(tx) = channels.get(channel) {
            if tx.send(token.to_string()).is_err() {
                // last subscriber is gone; release the channel
                channels.remove(channel);
            }
        }
        tracing::debug!(channel, token, "published");
    }

    async fn subscribe(&self, channel: &str) -> Subscription {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Subscription { rx: tx.subscribe() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_are_scoped() {
        assert_eq!(org_events_channel("o1"), "organization.o1.events");
        assert_eq!(org_event_channel("o1", "e1"), "organization.o1.event.e1");
        assert_eq!(org_storage_channel("o1"), "organization.o1.storage");
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let broker = InProcessBroker::new();
        let mut a = broker.subscribe("ch").await;
        let mut b = broker.subscribe("ch").await;

        broker.publish("ch", "k1").await;

        assert_eq!(a.recv().await.as_deref(), Some("k1"));
        assert_eq!(b.recv().await.as_deref(), Some("k1"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let broker = InProcessBroker::new();
        broker.publish("nobody", "k1").await;
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let broker = InProcessBroker::new();
        let mut a = broker.subscribe("one").await;
        broker.publish("two", "x").await;
        broker.publish("one", "y").await;
        assert_eq!(a.recv().await.as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn lagged_subscriber_is_dropped() {
        let broker = InProcessBroker::new();
        let mut slow = broker.subscribe("ch").await;
        for i in 0..(CHANNEL_CAPACITY + 8) {
            broker.publish("ch", &format!("k{i}")).await;
        }
        assert_eq!(slow.recv().await, None);
    }
}
