pub mod admin;
pub mod health;
pub mod promo_code;
pub mod reservation;
pub mod space;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /reservations                         list, create (auth required)
/// /reservations/quote                   price a window (POST)
/// /reservations/{id}                    get (owner or admin)
/// /reservations/{id}/window             move and re-price (PUT)
/// /reservations/{id}/cancel             cancel (POST)
///
/// /promo-codes/validate                 eligibility pre-check (POST)
///
/// /spaces                               list bookable spaces
/// /spaces/{id}/availability             advisory window check
///
/// /admin/spaces                         create (admin only)
/// /admin/spaces/{id}/availability       open or close a space (PUT)
/// /admin/promo-codes                    create (admin only)
/// /admin/promo-codes/{id}/usages        redemption history
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/reservations", reservation::router())
        .nest("/promo-codes", promo_code::router())
        .nest("/spaces", space::router())
        .nest("/admin", admin::router())
}
