//! Booking & pricing transaction engine.
//!
//! [`BookingEngine`] owns every write path for reservations and promo
//! redemptions. Each operation runs in a single PostgreSQL transaction with
//! explicit row locks; see [`booking`] for the lock order.

pub mod booking;
pub mod config;

pub use booking::{BookingEngine, BookingRequest, PromoValidation, Quote};
pub use config::EngineConfig;
