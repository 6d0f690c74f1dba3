//! Pure domain logic for the coworking booking engine.
//!
//! Nothing in this crate performs I/O. The database layer (`cowork-db`) and
//! the HTTP layer (`cowork-api`) call into these modules so that every money
//! calculation has exactly one implementation.

pub mod error;
pub mod pricing;
pub mod promo;
pub mod reservation;
pub mod roles;
pub mod search;
pub mod types;
