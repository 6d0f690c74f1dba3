use crate::types::{DbId, Money};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure taxonomy of the booking engine.
///
/// Every variant has a stable machine-readable [`kind`](BookingError::kind)
/// that is surfaced to clients next to the human-readable message. Any of
/// these returned from inside a booking transaction means the transaction
/// was rolled back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("End time must be after start time")]
    InvalidWindow,

    #[error("Space {space_id} not found")]
    ResourceNotFound { space_id: DbId },

    #[error("Space {space_id} is not available: {reason}")]
    ResourceUnavailable { space_id: DbId, reason: String },

    #[error("Participant count {requested} is outside the allowed range 1..={capacity}")]
    CapacityExceeded { requested: i32, capacity: i32 },

    #[error("Promo code '{code}' is invalid or expired")]
    PromoCodeInvalid { code: String },

    #[error("Promo code '{code}' has reached its usage limit")]
    PromoCodeExhausted { code: String },

    #[error("Promo code '{code}' has already been used by this user")]
    PromoCodeAlreadyUsed { code: String },

    #[error("Promo code '{code}' requires a minimum amount of {minimum}")]
    PromoCodeMinimumNotMet { code: String, minimum: Money },

    #[error("Promo code '{code}' does not apply to category '{category}'")]
    PromoCodeNotApplicable { code: String, category: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Reservation {reservation_id} not found")]
    BookingNotFound { reservation_id: DbId },

    #[error("Reservation {reservation_id} is {status} and can no longer be modified")]
    ReservationClosed {
        reservation_id: DbId,
        status: &'static str,
    },

    #[error("Store temporarily unavailable: {0}")]
    TransientStore(String),
}

impl BookingError {
    /// Stable error code for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::ResourceUnavailable { .. } => "RESOURCE_UNAVAILABLE",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::PromoCodeInvalid { .. } => "PROMO_CODE_INVALID",
            Self::PromoCodeExhausted { .. } => "PROMO_CODE_EXHAUSTED",
            Self::PromoCodeAlreadyUsed { .. } => "PROMO_CODE_ALREADY_USED",
            Self::PromoCodeMinimumNotMet { .. } => "PROMO_CODE_MINIMUM_NOT_MET",
            Self::PromoCodeNotApplicable { .. } => "PROMO_CODE_NOT_APPLICABLE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BookingNotFound { .. } => "BOOKING_NOT_FOUND",
            Self::ReservationClosed { .. } => "RESERVATION_CLOSED",
            Self::TransientStore(_) => "TRANSIENT_STORE_ERROR",
        }
    }

    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStore(_))
    }

    /// Whether this error came out of promo-code validation.
    pub fn is_promo_error(&self) -> bool {
        matches!(
            self,
            Self::PromoCodeInvalid { .. }
                | Self::PromoCodeExhausted { .. }
                | Self::PromoCodeAlreadyUsed { .. }
                | Self::PromoCodeMinimumNotMet { .. }
                | Self::PromoCodeNotApplicable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(BookingError::InvalidWindow.kind(), "INVALID_WINDOW");
        assert_eq!(
            BookingError::TransientStore("lock timeout".into()).kind(),
            "TRANSIENT_STORE_ERROR"
        );
        assert_eq!(
            BookingError::BookingNotFound { reservation_id: 3 }.kind(),
            "BOOKING_NOT_FOUND"
        );
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(BookingError::TransientStore("x".into()).is_retryable());
        assert!(!BookingError::InvalidWindow.is_retryable());
        assert!(!BookingError::ResourceUnavailable {
            space_id: 1,
            reason: "taken".into()
        }
        .is_retryable());
    }

    #[test]
    fn promo_errors_are_classified() {
        assert!(BookingError::PromoCodeExhausted { code: "A".into() }.is_promo_error());
        assert!(!BookingError::Forbidden("no".into()).is_promo_error());
    }
}
