//! Admin handlers for the space catalog and promo codes.
//!
//! These write catalog data directly through the repositories; they never
//! touch reservations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cowork_core::error::CoreError;
use cowork_core::pricing::RateCard;
use cowork_core::promo;
use cowork_core::types::DbId;
use cowork_db::models::promo_code::CreatePromoCode;
use cowork_db::models::space::CreateSpace;
use cowork_db::repositories::{PromoCodeRepo, PromoCodeUsageRepo, SpaceRepo};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /admin/spaces/{id}/availability`.
#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// POST /admin/spaces
pub async fn create_space(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateSpace>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() || input.category.trim().is_empty() {
        return Err(CoreError::Validation("name and category must not be blank".into()).into());
    }
    if input.capacity < 1 {
        return Err(CoreError::Validation("capacity must be at least 1".into()).into());
    }
    RateCard {
        per_hour: input.per_hour,
        per_half_day: input.per_half_day,
        per_day: input.per_day,
        per_week: input.per_week,
    }
    .validate()?;

    let space = SpaceRepo::create(&state.pool, &input).await?;

    tracing::info!(space_id = space.id, admin = admin.user_id, "Space created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: space })))
}

/// PUT /admin/spaces/{id}/availability -- open or close a space for booking.
pub async fn set_space_availability(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<SetAvailabilityRequest>,
) -> AppResult<impl IntoResponse> {
    let updated = SpaceRepo::set_available(&state.pool, id, input.is_available).await?;
    if !updated {
        return Err(CoreError::NotFound {
            entity: "Space",
            id,
        }
        .into());
    }

    tracing::info!(
        space_id = id,
        is_available = input.is_available,
        admin = admin.user_id,
        "Space availability changed"
    );
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Promo codes
// ---------------------------------------------------------------------------

/// POST /admin/promo-codes
pub async fn create_promo_code(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreatePromoCode>,
) -> AppResult<impl IntoResponse> {
    promo::validate_definition(
        &input.code,
        input.discount_type,
        input.discount_value,
        input.valid_from,
        input.valid_until,
        input.max_usage,
        input.minimum_amount,
    )?;

    let code = PromoCodeRepo::create(&state.pool, &input).await?;

    tracing::info!(
        promo_code_id = code.id,
        code = %code.code,
        admin = admin.user_id,
        "Promo code created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: code })))
}

/// GET /admin/promo-codes/{id}/usages -- redemption history of a code.
pub async fn list_promo_code_usages(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    PromoCodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "PromoCode",
            id,
        })?;

    let usages = PromoCodeUsageRepo::list_by_code(&state.pool, id).await?;
    Ok(Json(DataResponse { data: usages }))
}
