//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the booking engine,
//! which publishes after commit, and notification consumers.

use chrono::{DateTime, Utc};
use cowork_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const EVENT_RESERVATION_CREATED: &str = "reservation.created";
pub const EVENT_RESERVATION_UPDATED: &str = "reservation.updated";
pub const EVENT_RESERVATION_CANCELLED: &str = "reservation.cancelled";

// ---------------------------------------------------------------------------
// ReservationEvent
// ---------------------------------------------------------------------------

/// Something that happened to a reservation, published after commit.
///
/// Built with [`ReservationEvent::new`] and
/// [`with_payload`](ReservationEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationEvent {
    /// Dot-separated event name, e.g. `"reservation.created"`.
    pub event_type: String,

    pub reservation_id: DbId,

    pub space_id: DbId,

    /// Owner of the reservation, i.e. the user to notify.
    pub user_id: DbId,

    /// User who performed the action (an admin may act for the owner).
    pub actor_user_id: DbId,

    /// Event-specific data such as amounts or the new window.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ReservationEvent {
    pub fn new(
        event_type: impl Into<String>,
        reservation_id: DbId,
        space_id: DbId,
        user_id: DbId,
        actor_user_id: DbId,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            reservation_id,
            space_id,
            user_id,
            actor_user_id,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<ReservationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn publish(&self, event: ReservationEvent) {
        tracing::debug!(
            event_type = %event.event_type,
            reservation_id = event.reservation_id,
            "Publishing reservation event"
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ReservationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = ReservationEvent::new(EVENT_RESERVATION_CREATED, 10, 2, 7, 7)
            .with_payload(serde_json::json!({"gross_amount": "1000.00"}));
        bus.publish(event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, EVENT_RESERVATION_CREATED);
        assert_eq!(received.reservation_id, 10);
        assert_eq!(received.space_id, 2);
        assert_eq!(received.user_id, 7);
        assert_eq!(received.payload["gross_amount"], "1000.00");
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ReservationEvent::new(EVENT_RESERVATION_CANCELLED, 1, 1, 1, 2));

        assert_eq!(rx1.recv().await.unwrap().actor_user_id, 2);
        assert_eq!(rx2.recv().await.unwrap().actor_user_id, 2);
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(ReservationEvent::new(EVENT_RESERVATION_UPDATED, 1, 1, 1, 1));
    }

    #[tokio::test]
    async fn slow_receiver_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for id in 0..5 {
            bus.publish(ReservationEvent::new(EVENT_RESERVATION_CREATED, id, 1, 1, 1));
        }

        let result = rx.recv().await;
        assert!(matches!(
            result,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
