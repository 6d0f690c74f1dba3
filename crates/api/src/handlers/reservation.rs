//! Handlers for reservation endpoints.
//!
//! Every write is delegated to the [`BookingEngine`](crate::engine::BookingEngine);
//! handlers only translate HTTP input and enforce read access.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cowork_core::error::BookingError;
use cowork_core::reservation::ensure_can_manage;
use cowork_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use cowork_core::types::{DbId, Timestamp};
use cowork_db::models::reservation::{CreateReservation, UpdateReservationWindow};
use cowork_db::repositories::ReservationRepo;
use serde::Deserialize;

use crate::engine::BookingRequest;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Participant count assumed when the request omits it.
const DEFAULT_PARTICIPANTS: i32 = 1;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /reservations`.
#[derive(Debug, Deserialize)]
pub struct ListReservationsParams {
    /// Admin-only filter; ignored for members, who only see their own.
    pub user_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for `POST /reservations/quote`.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub space_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub promo_code: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /reservations
// ---------------------------------------------------------------------------

/// Book a space. The price is computed server-side; the body carries none.
pub async fn create_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateReservation>,
) -> AppResult<impl IntoResponse> {
    let request = BookingRequest {
        space_id: input.space_id,
        user_id: auth.user_id,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        participant_count: input.participant_count.unwrap_or(DEFAULT_PARTICIPANTS),
        promo_code: input.promo_code,
        notes: input.notes,
    };

    let reservation = state.engine.create_reservation(request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: reservation })))
}

// ---------------------------------------------------------------------------
// PUT /reservations/{id}/window
// ---------------------------------------------------------------------------

/// Move a reservation to a new window and re-price it.
pub async fn update_window(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateReservationWindow>,
) -> AppResult<impl IntoResponse> {
    let reservation = state.engine.update_window(id, &auth, &input).await?;
    Ok(Json(DataResponse { data: reservation }))
}

// ---------------------------------------------------------------------------
// POST /reservations/{id}/cancel
// ---------------------------------------------------------------------------

/// Cancel a reservation. Repeating the call returns the same result.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let reservation = state.engine.cancel_reservation(id, &auth).await?;
    Ok(Json(DataResponse { data: reservation }))
}

// ---------------------------------------------------------------------------
// POST /reservations/quote
// ---------------------------------------------------------------------------

/// Price a prospective reservation without booking it.
pub async fn quote_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<QuoteRequest>,
) -> AppResult<impl IntoResponse> {
    let quote = state
        .engine
        .quote(
            input.space_id,
            auth.user_id,
            input.starts_at,
            input.ends_at,
            input.promo_code.as_deref(),
        )
        .await?;
    Ok(Json(DataResponse { data: quote }))
}

// ---------------------------------------------------------------------------
// GET /reservations, GET /reservations/{id}
// ---------------------------------------------------------------------------

/// List reservations. Members see their own; admins see all, optionally
/// filtered by `user_id`.
pub async fn list_reservations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListReservationsParams>,
) -> AppResult<impl IntoResponse> {
    let user_filter = if auth.is_admin() {
        params.user_id
    } else {
        Some(auth.user_id)
    };
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let reservations = ReservationRepo::list(&state.pool, user_filter, limit, offset).await?;
    Ok(Json(DataResponse { data: reservations }))
}

/// Fetch a single reservation. Owner or admin only.
pub async fn get_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let reservation = ReservationRepo::find_with_space(&state.pool, id)
        .await?
        .ok_or(BookingError::BookingNotFound { reservation_id: id })?;
    ensure_can_manage(reservation.reservation.user_id, auth.user_id, &auth.role)?;

    Ok(Json(DataResponse { data: reservation }))
}
