//! Event-to-notification delivery loop.

use cowork_core::types::DbId;
use cowork_events::bus::{
    EVENT_RESERVATION_CANCELLED, EVENT_RESERVATION_CREATED, EVENT_RESERVATION_UPDATED,
};
use cowork_events::ReservationEvent;
use tokio::sync::broadcast;

/// Delivers reservation events to the affected users.
#[derive(Debug, Default)]
pub struct NotificationListener;

impl NotificationListener {
    pub fn new() -> Self {
        Self
    }

    /// Run the delivery loop until the [`EventBus`](cowork_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<ReservationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.deliver(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification listener shutting down");
                    break;
                }
            }
        }
    }

    fn deliver(&self, event: &ReservationEvent) {
        let Some(subject) = subject_for(&event.event_type) else {
            tracing::debug!(event_type = %event.event_type, "No notification for event type");
            return;
        };

        for user_id in recipients(event) {
            tracing::info!(
                user_id,
                reservation_id = event.reservation_id,
                space_id = event.space_id,
                subject,
                payload = %event.payload,
                "Reservation notification"
            );
        }
    }
}

/// Message subject for each reservation event type.
fn subject_for(event_type: &str) -> Option<&'static str> {
    match event_type {
        EVENT_RESERVATION_CREATED => Some("Your reservation was created"),
        EVENT_RESERVATION_UPDATED => Some("Your reservation window changed"),
        EVENT_RESERVATION_CANCELLED => Some("Your reservation was cancelled"),
        _ => None,
    }
}

/// The owner always hears about their reservation; an admin acting on
/// someone else's reservation gets a copy.
fn recipients(event: &ReservationEvent) -> Vec<DbId> {
    if event.actor_user_id == event.user_id {
        vec![event.user_id]
    } else {
        vec![event.user_id, event.actor_user_id]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use cowork_events::EventBus;

    use super::*;

    #[test]
    fn owner_acting_alone_is_sole_recipient() {
        let event = ReservationEvent::new(EVENT_RESERVATION_CREATED, 1, 1, 7, 7);
        assert_eq!(recipients(&event), vec![7]);
    }

    #[test]
    fn admin_actor_receives_a_copy() {
        let event = ReservationEvent::new(EVENT_RESERVATION_CANCELLED, 1, 1, 7, 99);
        assert_eq!(recipients(&event), vec![7, 99]);
    }

    #[test]
    fn unknown_event_types_have_no_subject() {
        assert!(subject_for("space.closed").is_none());
        assert!(subject_for(EVENT_RESERVATION_UPDATED).is_some());
    }

    #[tokio::test]
    async fn listener_stops_when_bus_is_dropped() {
        let bus = Arc::new(EventBus::default());
        let handle = tokio::spawn(NotificationListener::new().run(bus.subscribe()));

        bus.publish(ReservationEvent::new(EVENT_RESERVATION_CREATED, 1, 1, 1, 1));
        drop(bus);

        let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(finished.is_ok(), "listener should exit once the bus closes");
    }
}
