//! Reservation entity model and DTOs.
//!
//! Amount columns are written only by the booking engine. None of the
//! request DTOs below carry a price field.

use cowork_core::reservation::{ReservationStatus, StatusId};
use cowork_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reservations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub space_id: DbId,
    pub user_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub status_id: StatusId,
    pub pricing_unit: String,
    pub gross_amount: Money,
    pub discount_amount: Money,
    pub amount_paid: Money,
    pub promo_code_id: Option<DbId>,
    pub participant_count: i32,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Reservation {
    /// Typed status. `None` only if the lookup table and enum drift apart.
    pub fn status(&self) -> Option<ReservationStatus> {
        ReservationStatus::from_id(self.status_id)
    }

    /// Amount still owed after the discount.
    pub fn amount_due(&self) -> Money {
        self.gross_amount - self.discount_amount
    }
}

/// A reservation joined with its status name and space display fields.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationWithSpace {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub reservation: Reservation,
    pub status: String,
    pub space_name: String,
    pub space_category: String,
}

/// Request body for `POST /reservations`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservation {
    pub space_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub participant_count: Option<i32>,
    pub promo_code: Option<String>,
    pub notes: Option<String>,
}

/// Request body for `PUT /reservations/{id}/window`. Omitted bounds keep
/// their stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReservationWindow {
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
}

/// Insert payload built by the engine after pricing.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub space_id: DbId,
    pub user_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub pricing_unit: String,
    pub gross_amount: Money,
    pub discount_amount: Money,
    pub promo_code_id: Option<DbId>,
    pub participant_count: i32,
    pub notes: Option<String>,
}

/// The complete set of columns a window amendment may change.
#[derive(Debug, Clone)]
pub struct ReservationWindowUpdate {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub pricing_unit: String,
    pub gross_amount: Money,
    pub discount_amount: Money,
}
