//! Handlers for the space catalog and availability lookups.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use cowork_core::error::BookingError;
use cowork_core::pricing::validate_window;
use cowork_core::types::{DbId, Timestamp};
use cowork_db::repositories::{ReservationRepo, SpaceRepo};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /spaces`.
#[derive(Debug, Deserialize)]
pub struct ListSpacesParams {
    pub category: Option<String>,
}

/// Query parameters for `GET /spaces/{id}/availability`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

/// A window already held by another reservation. Owner details are omitted.
#[derive(Debug, Serialize)]
pub struct BusyWindow {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

/// Response of the availability lookup.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub space_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub is_available: bool,
    pub busy: Vec<BusyWindow>,
}

/// GET /spaces -- bookable spaces, optionally filtered by category.
pub async fn list_spaces(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ListSpacesParams>,
) -> AppResult<impl IntoResponse> {
    let spaces = SpaceRepo::list_available(&state.pool, params.category.as_deref()).await?;
    Ok(Json(DataResponse { data: spaces }))
}

/// GET /spaces/{id}/availability -- whether a window is free right now.
///
/// A lock-free read: the answer is advisory and a booking may still lose
/// the race.
pub async fn get_availability(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(space_id): Path<DbId>,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<impl IntoResponse> {
    validate_window(params.starts_at, params.ends_at)?;

    let space = SpaceRepo::find_by_id(&state.pool, space_id)
        .await?
        .ok_or(BookingError::ResourceNotFound { space_id })?;

    let busy: Vec<BusyWindow> =
        ReservationRepo::find_overlapping(&state.pool, space_id, params.starts_at, params.ends_at)
            .await?
            .into_iter()
            .map(|r| BusyWindow {
                starts_at: r.starts_at,
                ends_at: r.ends_at,
            })
            .collect();

    Ok(Json(DataResponse {
        data: AvailabilityResponse {
            space_id,
            starts_at: params.starts_at,
            ends_at: params.ends_at,
            is_available: space.is_available && busy.is_empty(),
            busy,
        },
    }))
}
