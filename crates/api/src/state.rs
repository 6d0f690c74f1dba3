use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::BookingEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, for plain reads.
    pub pool: cowork_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The booking engine; every reservation write and promo check goes
    /// through it. Owns the post-commit event bus sender.
    pub engine: Arc<BookingEngine>,
}
