//! Route definitions for promo codes.

use axum::routing::post;
use axum::Router;

use crate::handlers::promo_code;
use crate::state::AppState;

/// Promo code routes mounted at `/promo-codes`.
///
/// ```text
/// POST /validate        -> validate_promo_code
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(promo_code::validate_promo_code))
}
