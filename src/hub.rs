//! Fan-out of live events to every connected dashboard.
//!
//! The hub is an owned registry, cloned into whatever needs to publish. Each
//! subscriber gets a small bounded queue; a subscriber whose queue is full
//! misses that event, and one whose receiver is gone is dropped from the set.
//! There is no replay and no ordering guarantee across subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{BroadcastEnvelope, EventKind};

/// Pending messages a single subscriber may hold before events are skipped.
const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::Sender<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    registry: Arc<Mutex<Registry>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a live subscriber. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut registry = self.registry.lock().expect("hub lock poisoned");
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);

        Subscription {
            id,
            rx,
            hub: self.clone(),
        }
    }

    fn unsubscribe(&self, id: u64) {
        let mut registry = self.registry.lock().expect("hub lock poisoned");
        registry.subscribers.remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .expect("hub lock poisoned")
            .subscribers
            .len()
    }

    /// Serializes one `{type, data, timestamp}` envelope and offers the same
    /// text to every open subscriber. Returns how many accepted it.
    pub fn broadcast<T: Serialize>(&self, kind: EventKind, data: &T) -> usize {
        let envelope = match serde_json::to_value(data) {
            Ok(data) => BroadcastEnvelope {
                kind,
                data,
                timestamp: Utc::now().timestamp_millis(),
            },
            Err(e) => {
                tracing::error!("Failed to serialize {} event: {}", kind.as_str(), e);
                return 0;
            }
        };
        let message = match serde_json::to_string(&envelope) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Failed to serialize {} envelope: {}", kind.as_str(), e);
                return 0;
            }
        };

        let mut registry = self.registry.lock().expect("hub lock poisoned");
        let mut delivered = 0;
        registry
            .subscribers
            .retain(|id, tx| match tx.try_send(message.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("Subscriber {} is busy, skipping {} event", id, kind.as_str());
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });

        tracing::trace!("Broadcast {} event to {} subscribers", kind.as_str(), delivered);
        delivered
    }
}

/// A registered subscriber's end of the hub.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<String>,
    hub: BroadcastHub,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next serialized envelope.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_open_subscriber_gets_the_identical_envelope() {
        let hub = BroadcastHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        let delivered = hub.broadcast(EventKind::Tasks, &json!([{ "id": "1" }]));
        assert_eq!(delivered, 2);

        let a = first.try_recv().expect("first subscriber got nothing");
        let b = second.try_recv().expect("second subscriber got nothing");
        assert_eq!(a, b);

        let envelope: BroadcastEnvelope = serde_json::from_str(&a).unwrap();
        assert_eq!(envelope.kind, EventKind::Tasks);
        assert_eq!(envelope.data, json!([{ "id": "1" }]));
        assert!(envelope.timestamp > 0);
    }

    #[test]
    fn envelope_uses_type_data_timestamp_keys() {
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe();
        hub.broadcast(EventKind::Health, &json!({ "uptime": "1 hour" }));

        let raw: serde_json::Value = serde_json::from_str(&sub.try_recv().unwrap()).unwrap();
        assert_eq!(raw["type"], "health");
        assert_eq!(raw["data"]["uptime"], "1 hour");
        assert!(raw["timestamp"].is_i64());
    }

    #[test]
    fn dropped_subscription_leaves_the_set() {
        let hub = BroadcastHub::new();
        let kept = hub.subscribe();
        let gone = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(gone);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.broadcast(EventKind::Memory, &json!([])), 1);
        drop(kept);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn broadcast_with_no_subscribers_is_a_no_op() {
        let hub = BroadcastHub::new();
        assert_eq!(hub.broadcast(EventKind::System, &json!({})), 0);
    }

    #[test]
    fn busy_subscriber_skips_events_but_stays_registered() {
        let hub = BroadcastHub::new();
        let mut slow = hub.subscribe();

        for _ in 0..SUBSCRIBER_BUFFER {
            assert_eq!(hub.broadcast(EventKind::Health, &json!({})), 1);
        }
        assert_eq!(hub.broadcast(EventKind::Health, &json!({})), 0);
        assert_eq!(hub.subscriber_count(), 1);

        assert!(slow.try_recv().is_some());
        assert_eq!(hub.broadcast(EventKind::Health, &json!({})), 1);
    }
}
