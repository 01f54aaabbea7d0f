//! Contact change events
//!
//! Emitted after a batch commits; never for a batch that rolled back.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Contact change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContactEvent {
    /// A new contact was committed
    Created {
        identifier: String,
        /// Number of operations in the committed batch
        operations: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An existing contact was reconciled and changed
    Updated {
        identifier: String,
        operations: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One or more contacts were removed
    Deleted {
        identifiers: Vec<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast bus for contact events
///
/// Subscribers only see events emitted after they subscribe; a slow
/// subscriber loses the oldest events once `capacity` is exceeded.
pub struct EventBus {
    tx: broadcast::Sender<ContactEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContactEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ContactEvent,
    ) -> Result<usize, broadcast::error::SendError<ContactEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ContactEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        let event = ContactEvent::Deleted {
            identifiers: vec!["abc".to_string()],
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(bus.emit(event.clone()).unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(10);
        let event = ContactEvent::Created {
            identifier: "abc".to_string(),
            operations: 3,
            timestamp: chrono::Utc::now(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 10);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = ContactEvent::Updated {
            identifier: "abc".to_string(),
            operations: 1,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Updated");
        assert_eq!(json["identifier"], "abc");
    }
}
