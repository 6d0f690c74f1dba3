//! Reservation lifecycle rules: statuses, participant limits, ownership and
//! window amendment pricing.

use serde::Serialize;

use crate::error::BookingError;
use crate::pricing::{calculate_price, PriceQuote, RateCard};
use crate::promo::clamp_discount;
use crate::roles::is_admin;
use crate::types::{DbId, Money, Timestamp};

/// Status ID type matching SMALLINT in the `reservation_statuses` table.
pub type StatusId = i16;

/// Reservation lifecycle status.
///
/// Discriminants match the seed order of `reservation_statuses`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending = 1,
    Confirmed = 2,
    InProgress = 3,
    Cancelled = 4,
    Completed = 5,
}

/// Statuses that hold a space and therefore conflict with new reservations.
pub const HOLDING_STATUSES: [ReservationStatus; 3] = [
    ReservationStatus::Pending,
    ReservationStatus::Confirmed,
    ReservationStatus::InProgress,
];

impl ReservationStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Confirmed),
            3 => Some(Self::InProgress),
            4 => Some(Self::Cancelled),
            5 => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Cancelled and completed reservations are final.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Allowed lifecycle transitions.
    ///
    /// ```text
    /// pending -> confirmed -> in_progress -> completed
    ///    \__________\_____________\-------> cancelled
    /// ```
    pub fn can_transition_to(self, next: Self) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

impl From<ReservationStatus> for StatusId {
    fn from(value: ReservationStatus) -> Self {
        value as StatusId
    }
}

/// Holding status ids, ready to bind as a SQL array.
pub fn holding_status_ids() -> Vec<StatusId> {
    HOLDING_STATUSES.iter().map(|s| s.id()).collect()
}

/// Check `requested` against the space capacity.
pub fn validate_participants(requested: i32, capacity: i32) -> Result<(), BookingError> {
    if requested < 1 || requested > capacity {
        return Err(BookingError::CapacityExceeded {
            requested,
            capacity,
        });
    }
    Ok(())
}

/// Only the owner or an administrator may act on a reservation.
pub fn ensure_can_manage(
    owner_id: DbId,
    caller_id: DbId,
    caller_role: &str,
) -> Result<(), BookingError> {
    if owner_id == caller_id || is_admin(caller_role) {
        Ok(())
    } else {
        Err(BookingError::Forbidden(
            "Only the reservation owner or an administrator may do this".into(),
        ))
    }
}

/// New amounts for a reservation whose window changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmendedPrice {
    pub quote: PriceQuote,
    pub discount_amount: Money,
}

/// Re-price an amended window.
///
/// The previously granted discount is carried over without re-validating
/// the promo code, but it is capped at the new gross amount so the amount
/// due can never go negative.
pub fn reprice_window(
    rates: &RateCard,
    starts_at: Timestamp,
    ends_at: Timestamp,
    previous_discount: Money,
) -> Result<AmendedPrice, BookingError> {
    let quote = calculate_price(rates, starts_at, ends_at)?;
    let discount_amount = clamp_discount(previous_discount, quote.amount);
    Ok(AmendedPrice {
        quote,
        discount_amount,
    })
}
