//! Handler for the standalone promo code check.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use cowork_core::types::Money;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /promo-codes/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidatePromoCodeRequest {
    pub code: String,
    /// Gross amount the code would be applied to.
    pub amount: Money,
    /// Category of the space being booked.
    pub category: String,
}

/// Check whether the caller could redeem a code. Nothing is reserved or
/// counted; the answer can change before the booking is made.
pub async fn validate_promo_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ValidatePromoCodeRequest>,
) -> AppResult<impl IntoResponse> {
    let validation = state
        .engine
        .validate_promo_code(&input.code, auth.user_id, input.amount, &input.category)
        .await?;
    Ok(Json(DataResponse { data: validation }))
}
