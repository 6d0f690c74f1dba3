//! Post-commit reservation events.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ReservationEvent`] — the envelope published after a reservation
//!   transaction commits.
//!
//! Publishing never blocks and never fails the caller. Consumers that fall
//! behind lose events, which is acceptable for notifications and never
//! affects committed reservations.

pub mod bus;

pub use bus::{EventBus, ReservationEvent};
