use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cowork_core::error::{BookingError, CoreError};
use serde_json::json;

/// PostgreSQL SQLSTATE codes treated as transient.
///
/// `55P03` lock_not_available (lock_timeout), `40P01` deadlock_detected,
/// `40001` serialization_failure, `57014` query_canceled (statement timeout).
const TRANSIENT_SQLSTATES: [&str; 4] = ["55P03", "40P01", "40001", "57014"];

/// Application-level error type for HTTP handlers and the booking engine.
///
/// Wraps [`CoreError`] and [`BookingError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A generic domain-level error from `cowork_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A booking engine failure with a stable kind.
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// A non-transient database error from sqlx.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    /// Lock-wait timeouts, deadlocks and connectivity failures become
    /// [`BookingError::TransientStore`]: nothing was committed, so the caller
    /// may retry the whole operation.
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            tracing::warn!(error = %err, "Transient store error");
            AppError::Booking(BookingError::TransientStore(err.to_string()))
        } else {
            AppError::Database(err)
        }
    }
}

/// Whether a sqlx error is safe to retry.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.iter().any(|s| *s == code)),
        _ => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Booking engine errors ---
            AppError::Booking(err) => (booking_status(err), err.kind(), err.to_string()),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let AppError::Booking(err) = &self {
            if err.is_retryable() {
                body["retryable"] = json!(true);
            }
        }

        (status, axum::Json(body)).into_response()
    }
}

/// HTTP status for each booking error kind.
fn booking_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::InvalidWindow
        | BookingError::CapacityExceeded { .. }
        | BookingError::PromoCodeInvalid { .. }
        | BookingError::PromoCodeMinimumNotMet { .. }
        | BookingError::PromoCodeNotApplicable { .. } => StatusCode::BAD_REQUEST,
        BookingError::ResourceNotFound { .. } | BookingError::BookingNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        BookingError::ResourceUnavailable { .. }
        | BookingError::PromoCodeExhausted { .. }
        | BookingError::PromoCodeAlreadyUsed { .. }
        | BookingError::ReservationClosed { .. } => StatusCode::CONFLICT,
        BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
        BookingError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Classify a non-transient sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
