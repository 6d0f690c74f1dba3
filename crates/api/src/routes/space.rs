//! Route definitions for the space catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::space;
use crate::state::AppState;

/// Space routes mounted at `/spaces`.
///
/// ```text
/// GET /                     -> list_spaces
/// GET /{id}/availability    -> get_availability
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(space::list_spaces))
        .route("/{id}/availability", get(space::get_availability))
}
