//! Route definitions for admin catalog management.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes mounted at `/admin`. Every handler requires the admin role.
///
/// ```text
/// POST /spaces                        -> create_space
/// PUT  /spaces/{id}/availability      -> set_space_availability
/// POST /promo-codes                   -> create_promo_code
/// GET  /promo-codes/{id}/usages       -> list_promo_code_usages
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/spaces", post(admin::create_space))
        .route("/spaces/{id}/availability", put(admin::set_space_availability))
        .route("/promo-codes", post(admin::create_promo_code))
        .route("/promo-codes/{id}/usages", get(admin::list_promo_code_usages))
}
