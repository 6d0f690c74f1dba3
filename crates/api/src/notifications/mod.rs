//! Post-commit reservation notifications.
//!
//! [`NotificationListener`] consumes the event bus and delivers one message
//! per recipient. Delivery is log-only for now; a failed or lagging
//! listener never affects the booking that produced the event.

pub mod listener;

pub use listener::NotificationListener;
