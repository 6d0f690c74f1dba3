//! Route definitions for reservations.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::reservation;
use crate::state::AppState;

/// Reservation routes mounted at `/reservations`.
///
/// ```text
/// GET  /                -> list_reservations
/// POST /                -> create_reservation
/// POST /quote           -> quote_reservation
/// GET  /{id}            -> get_reservation
/// PUT  /{id}/window     -> update_window
/// POST /{id}/cancel     -> cancel_reservation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reservation::list_reservations).post(reservation::create_reservation),
        )
        .route("/quote", post(reservation::quote_reservation))
        .route("/{id}", get(reservation::get_reservation))
        .route("/{id}/window", put(reservation::update_window))
        .route("/{id}/cancel", post(reservation::cancel_reservation))
}
