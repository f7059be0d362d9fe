//! Event bus for inter-component communication
//!
//! Uses tokio::sync::broadcast for pub/sub pattern. Browser pages receive
//! the same events over `/events` and reload when devices change.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event types that can be published on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    DeviceCreated { id: String },
    DeviceUpdated { id: String },
    DeviceActionApplied { id: String },
    DeviceRemoved { id: String },
    /// Cached device data was invalidated and fetched again.
    DevicesRefreshed { device_count: usize },
    /// Fetching device data from the backend failed.
    BackendError { message: String },
}

impl BusEvent {
    /// Whether an open dashboard should reload after this event.
    pub fn changes_devices(&self) -> bool {
        !matches!(self, BusEvent::BackendError { .. })
    }
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: BusEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub type SharedBus = Arc<EventBus>;

pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pubsub() {
        let bus = create_bus();
        let mut rx = bus.subscribe();

        bus.publish(BusEvent::DeviceCreated {
            id: "wh1".to_string(),
        });

        match rx.recv().await.unwrap() {
            BusEvent::DeviceCreated { id } => assert_eq!(id, "wh1"),
            other => panic!("Wrong event type: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = create_bus();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(BusEvent::DevicesRefreshed { device_count: 3 });

        assert!(matches!(
            rx1.recv().await.unwrap(),
            BusEvent::DevicesRefreshed { device_count: 3 }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            BusEvent::DevicesRefreshed { .. }
        ));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(BusEvent::DeviceRemoved { id: "c1".into() }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "DeviceRemoved", "payload": {"id": "c1"}})
        );
        assert!(!BusEvent::BackendError {
            message: "down".into()
        }
        .changes_devices());
    }
}
