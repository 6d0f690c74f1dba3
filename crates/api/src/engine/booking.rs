//! Reservation creation, amendment, cancellation and promo validation.
//!
//! Every write runs in one transaction:
//!
//! ```text
//! Started -> ResourceChecked -> Priced -> PromoResolved -> Persisted -> Committed
//!    \___________\________________\__________\_______________\------> RolledBack
//! ```
//!
//! Lock order is always space row, then reservation rows, then the promo
//! code row. Creation and amendment both start by locking the space, so two
//! writers for the same space are strictly serialized even when no
//! overlapping reservation row exists yet. Lock waits are bounded by
//! `lock_timeout`; a timeout surfaces as a retryable transient error.

use std::sync::Arc;

use chrono::SecondsFormat;
use cowork_core::error::BookingError;
use cowork_core::pricing::{calculate_price, validate_window, PricingUnit, MAX_MONEY};
use cowork_core::promo::{normalize_code, PromoOutcome};
use cowork_core::reservation::{
    ensure_can_manage, reprice_window, validate_participants, ReservationStatus,
};
use cowork_core::types::{DbId, Money, Timestamp};
use cowork_db::models::promo_code::PromoCode;
use cowork_db::models::promo_code_usage::NewPromoCodeUsage;
use cowork_db::models::reservation::{
    NewReservation, Reservation, ReservationWindowUpdate, ReservationWithSpace,
    UpdateReservationWindow,
};
use cowork_db::repositories::{PromoCodeRepo, PromoCodeUsageRepo, ReservationRepo, SpaceRepo};
use cowork_db::DbPool;
use cowork_events::bus::{
    EVENT_RESERVATION_CANCELLED, EVENT_RESERVATION_CREATED, EVENT_RESERVATION_UPDATED,
};
use cowork_events::{EventBus, ReservationEvent};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use sqlx::{PgConnection, Postgres, Transaction};

use super::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Progress of a booking transaction, used for tracing and rollback logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Started,
    ResourceChecked,
    Priced,
    PromoResolved,
    Persisted,
    Committed,
}

/// How the promo code row is locked while it is evaluated.
#[derive(Debug, Clone, Copy)]
enum PromoLock {
    /// `FOR UPDATE`: the code is about to be redeemed.
    Exclusive,
    /// `FOR SHARE`: read-only pre-check.
    Shared,
}

/// Input of [`BookingEngine::create_reservation`].
///
/// Carries no amount: the price is always computed from the space's rates.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub space_id: DbId,
    pub user_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub participant_count: i32,
    pub promo_code: Option<String>,
    pub notes: Option<String>,
}

/// Result of a standalone promo code check.
#[derive(Debug, Clone, Serialize)]
pub struct PromoValidation {
    pub promo_code_id: DbId,
    pub code: String,
    pub amount: Money,
    pub discount: Money,
    pub final_amount: Money,
}

/// Price of a prospective reservation.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub space_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub pricing_unit: PricingUnit,
    pub gross_amount: Money,
    pub discount_amount: Money,
    pub amount_due: Money,
    pub promo_code_id: Option<DbId>,
}

/// A code that passed every eligibility rule under lock.
struct EvaluatedPromo {
    promo: PromoCode,
    outcome: PromoOutcome,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Transactional booking engine shared by all request handlers.
pub struct BookingEngine {
    pool: DbPool,
    config: EngineConfig,
    events: Arc<EventBus>,
}

impl BookingEngine {
    pub fn new(pool: DbPool, config: EngineConfig, events: Arc<EventBus>) -> Self {
        Self {
            pool,
            config,
            events,
        }
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Book a space for `[starts_at, ends_at)`, optionally redeeming a promo
    /// code.
    ///
    /// All-or-nothing: a promo failure fails the whole booking, and no
    /// reservation or usage row survives any error.
    pub async fn create_reservation(
        &self,
        mut request: BookingRequest,
    ) -> AppResult<ReservationWithSpace> {
        validate_window(request.starts_at, request.ends_at)?;
        request.promo_code = request
            .promo_code
            .take()
            .filter(|code| !code.trim().is_empty());

        let mut tx = self.begin().await?;
        let mut stage = Stage::Started;

        let created = match Self::create_in_tx(&mut tx, &request, &mut stage).await {
            Ok(created) => created,
            Err(err) => {
                Self::abort(tx, stage, &err).await;
                return Err(err);
            }
        };

        tx.commit().await?;
        advance(&mut stage, Stage::Committed);

        let r = &created.reservation;
        tracing::info!(
            reservation_id = r.id,
            space_id = r.space_id,
            user_id = r.user_id,
            gross_amount = %r.gross_amount,
            discount_amount = %r.discount_amount,
            promo_code_id = ?r.promo_code_id,
            "Reservation created"
        );
        self.publish(EVENT_RESERVATION_CREATED, r, request.user_id);

        Ok(created)
    }

    async fn create_in_tx(
        conn: &mut PgConnection,
        request: &BookingRequest,
        stage: &mut Stage,
    ) -> AppResult<ReservationWithSpace> {
        let space_id = request.space_id;

        let space = SpaceRepo::lock_by_id(&mut *conn, space_id)
            .await?
            .ok_or(BookingError::ResourceNotFound { space_id })?;
        if !space.is_available {
            return Err(BookingError::ResourceUnavailable {
                space_id,
                reason: "space is closed for booking".into(),
            }
            .into());
        }

        validate_participants(request.participant_count, space.capacity)?;

        ensure_window_free(
            &mut *conn,
            space_id,
            request.starts_at,
            request.ends_at,
            None,
        )
        .await?;
        advance(stage, Stage::ResourceChecked);

        let quote = calculate_price(&space.rate_card(), request.starts_at, request.ends_at)?;
        advance(stage, Stage::Priced);

        let evaluated = match request.promo_code.as_deref() {
            Some(code) => Some(
                Self::evaluate_promo(
                    &mut *conn,
                    code,
                    request.user_id,
                    quote.amount,
                    &space.category,
                    PromoLock::Exclusive,
                )
                .await?,
            ),
            None => None,
        };
        advance(stage, Stage::PromoResolved);

        let discount = evaluated
            .as_ref()
            .map_or(Decimal::ZERO, |e| e.outcome.discount);

        let reservation = ReservationRepo::insert(
            &mut *conn,
            &NewReservation {
                space_id,
                user_id: request.user_id,
                starts_at: request.starts_at,
                ends_at: request.ends_at,
                pricing_unit: quote.unit.as_str().to_string(),
                gross_amount: quote.amount,
                discount_amount: discount,
                promo_code_id: evaluated.as_ref().map(|e| e.promo.id),
                participant_count: request.participant_count,
                notes: request.notes.clone(),
            },
        )
        .await?;

        if let Some(evaluated) = &evaluated {
            PromoCodeUsageRepo::insert(
                &mut *conn,
                &NewPromoCodeUsage {
                    promo_code_id: evaluated.promo.id,
                    user_id: request.user_id,
                    reservation_id: reservation.id,
                    discount_amount: evaluated.outcome.discount,
                    amount_before: quote.amount,
                    amount_after: evaluated.outcome.final_amount,
                },
            )
            .await?;
            let usage_count = PromoCodeRepo::increment_usage(&mut *conn, evaluated.promo.id).await?;
            tracing::debug!(
                promo_code_id = evaluated.promo.id,
                usage_count,
                "Promo code redeemed"
            );
        }
        advance(stage, Stage::Persisted);

        load_joined(conn, reservation.id).await
    }

    // ── Amend ────────────────────────────────────────────────────────

    /// Move a reservation to a new window and re-price it.
    ///
    /// The gross amount is recomputed from the space's rates. The discount
    /// granted at creation is carried over without re-validating the promo
    /// code, capped at the new gross amount.
    pub async fn update_window(
        &self,
        reservation_id: DbId,
        caller: &AuthUser,
        update: &UpdateReservationWindow,
    ) -> AppResult<ReservationWithSpace> {
        let mut tx = self.begin().await?;
        let mut stage = Stage::Started;

        let updated =
            match Self::amend_in_tx(&mut tx, reservation_id, caller, update, &mut stage).await {
                Ok(updated) => updated,
                Err(err) => {
                    Self::abort(tx, stage, &err).await;
                    return Err(err);
                }
            };

        tx.commit().await?;
        advance(&mut stage, Stage::Committed);

        let r = &updated.reservation;
        tracing::info!(
            reservation_id = r.id,
            gross_amount = %r.gross_amount,
            discount_amount = %r.discount_amount,
            "Reservation window updated"
        );
        self.publish(EVENT_RESERVATION_UPDATED, r, caller.user_id);

        Ok(updated)
    }

    async fn amend_in_tx(
        conn: &mut PgConnection,
        reservation_id: DbId,
        caller: &AuthUser,
        update: &UpdateReservationWindow,
        stage: &mut Stage,
    ) -> AppResult<ReservationWithSpace> {
        // Unlocked read to learn the space, so the space row can be locked
        // before the reservation row.
        let current = ReservationRepo::find_by_id(&mut *conn, reservation_id)
            .await?
            .ok_or(BookingError::BookingNotFound { reservation_id })?;
        ensure_can_manage(current.user_id, caller.user_id, &caller.role)?;

        let space = SpaceRepo::lock_by_id(&mut *conn, current.space_id)
            .await?
            .ok_or(BookingError::ResourceNotFound {
                space_id: current.space_id,
            })?;
        let reservation = ReservationRepo::lock_by_id(&mut *conn, reservation_id)
            .await?
            .ok_or(BookingError::BookingNotFound { reservation_id })?;

        let status = status_of(&reservation)?;
        if status.is_closed() {
            return Err(BookingError::ReservationClosed {
                reservation_id,
                status: status.as_str(),
            }
            .into());
        }

        let starts_at = update.starts_at.unwrap_or(reservation.starts_at);
        let ends_at = update.ends_at.unwrap_or(reservation.ends_at);
        validate_window(starts_at, ends_at)?;

        ensure_window_free(&mut *conn, space.id, starts_at, ends_at, Some(reservation_id)).await?;
        advance(stage, Stage::ResourceChecked);

        let amended = reprice_window(
            &space.rate_card(),
            starts_at,
            ends_at,
            reservation.discount_amount,
        )?;
        if amended.discount_amount != reservation.discount_amount {
            tracing::warn!(
                reservation_id,
                previous_discount = %reservation.discount_amount,
                capped_discount = %amended.discount_amount,
                "Carried-over discount capped at new gross amount"
            );
        }
        advance(stage, Stage::Priced);

        ReservationRepo::update_window(
            &mut *conn,
            reservation_id,
            &ReservationWindowUpdate {
                starts_at,
                ends_at,
                pricing_unit: amended.quote.unit.as_str().to_string(),
                gross_amount: amended.quote.amount,
                discount_amount: amended.discount_amount,
            },
        )
        .await?;
        advance(stage, Stage::Persisted);

        load_joined(conn, reservation_id).await
    }

    // ── Cancel ───────────────────────────────────────────────────────

    /// Cancel a reservation. Cancelling an already cancelled reservation is
    /// a no-op that returns it unchanged.
    pub async fn cancel_reservation(
        &self,
        reservation_id: DbId,
        caller: &AuthUser,
    ) -> AppResult<ReservationWithSpace> {
        let mut tx = self.begin().await?;

        let (cancelled, changed) =
            match Self::cancel_in_tx(&mut tx, reservation_id, caller).await {
                Ok(result) => result,
                Err(err) => {
                    Self::abort(tx, Stage::Started, &err).await;
                    return Err(err);
                }
            };

        tx.commit().await?;

        if changed {
            tracing::info!(reservation_id, actor = caller.user_id, "Reservation cancelled");
            self.publish(
                EVENT_RESERVATION_CANCELLED,
                &cancelled.reservation,
                caller.user_id,
            );
        } else {
            tracing::debug!(reservation_id, "Reservation already cancelled");
        }

        Ok(cancelled)
    }

    async fn cancel_in_tx(
        conn: &mut PgConnection,
        reservation_id: DbId,
        caller: &AuthUser,
    ) -> AppResult<(ReservationWithSpace, bool)> {
        let reservation = ReservationRepo::lock_by_id(&mut *conn, reservation_id)
            .await?
            .ok_or(BookingError::BookingNotFound { reservation_id })?;
        ensure_can_manage(reservation.user_id, caller.user_id, &caller.role)?;

        let status = status_of(&reservation)?;
        if status == ReservationStatus::Cancelled {
            return Ok((load_joined(conn, reservation_id).await?, false));
        }
        if !status.can_transition_to(ReservationStatus::Cancelled) {
            return Err(BookingError::ReservationClosed {
                reservation_id,
                status: status.as_str(),
            }
            .into());
        }

        ReservationRepo::set_status(&mut *conn, reservation_id, ReservationStatus::Cancelled)
            .await?;

        Ok((load_joined(conn, reservation_id).await?, true))
    }

    // ── Promo pre-check and quotes ───────────────────────────────────

    /// Check whether `user_id` could redeem `code` against `amount` for a
    /// space of `category`. Same rules as redemption, but nothing is
    /// reserved or incremented.
    pub async fn validate_promo_code(
        &self,
        code: &str,
        user_id: DbId,
        amount: Money,
        category: &str,
    ) -> AppResult<PromoValidation> {
        if amount < Decimal::ZERO {
            return Err(AppError::BadRequest("amount must not be negative".into()));
        }
        if amount > MAX_MONEY {
            return Err(AppError::BadRequest(format!(
                "amount must not exceed {MAX_MONEY}"
            )));
        }

        let mut tx = self.begin().await?;
        let result =
            Self::evaluate_promo(&mut tx, code, user_id, amount, category, PromoLock::Shared).await;
        // Read-only transaction: releasing the shared lock is all that is left.
        if let Err(err) = tx.rollback().await {
            tracing::warn!(error = %err, "Failed to close promo validation transaction");
        }

        let evaluated = result?;
        Ok(PromoValidation {
            promo_code_id: evaluated.promo.id,
            code: evaluated.promo.code,
            amount,
            discount: evaluated.outcome.discount,
            final_amount: evaluated.outcome.final_amount,
        })
    }

    /// Price a prospective reservation without writing anything.
    pub async fn quote(
        &self,
        space_id: DbId,
        user_id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
        promo_code: Option<&str>,
    ) -> AppResult<Quote> {
        let space = SpaceRepo::find_by_id(&self.pool, space_id)
            .await?
            .ok_or(BookingError::ResourceNotFound { space_id })?;
        if !space.is_available {
            return Err(BookingError::ResourceUnavailable {
                space_id,
                reason: "space is closed for booking".into(),
            }
            .into());
        }

        let price = calculate_price(&space.rate_card(), starts_at, ends_at)?;

        let promo = match promo_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => Some(
                self.validate_promo_code(code, user_id, price.amount, &space.category)
                    .await?,
            ),
            None => None,
        };
        let discount_amount = promo.as_ref().map_or(Decimal::ZERO, |p| p.discount);

        Ok(Quote {
            space_id,
            starts_at,
            ends_at,
            pricing_unit: price.unit,
            gross_amount: price.amount,
            discount_amount,
            amount_due: price.amount - discount_amount,
            promo_code_id: promo.map(|p| p.promo_code_id),
        })
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Begin a transaction with the configured lock wait bound.
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(self.config.lock_timeout_setting())
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn abort(tx: Transaction<'static, Postgres>, stage: Stage, err: &AppError) {
        match err {
            AppError::Booking(booking) if booking.is_promo_error() => tracing::info!(
                stage = ?stage,
                kind = booking.kind(),
                "Promo code rejected, booking rolled back"
            ),
            _ => tracing::warn!(stage = ?stage, error = %err, "Booking transaction rolled back"),
        }
        if let Err(rollback_err) = tx.rollback().await {
            // The connection is discarded by the pool; PostgreSQL aborts the
            // transaction when the session ends.
            tracing::error!(error = %rollback_err, "Explicit rollback failed");
        }
    }

    /// Run every promo rule against the locked code row.
    async fn evaluate_promo(
        conn: &mut PgConnection,
        code: &str,
        user_id: DbId,
        amount: Money,
        category: &str,
        lock: PromoLock,
    ) -> AppResult<EvaluatedPromo> {
        let promo = match lock {
            PromoLock::Exclusive => PromoCodeRepo::lock_redeemable(&mut *conn, code).await?,
            PromoLock::Shared => PromoCodeRepo::share_lock_redeemable(&mut *conn, code).await?,
        }
        .ok_or_else(|| BookingError::PromoCodeInvalid {
            code: normalize_code(code),
        })?;

        let terms = promo.terms()?;
        let already_used =
            PromoCodeUsageRepo::exists_for_user(&mut *conn, promo.id, user_id).await?;
        let outcome = terms.evaluate(amount, category, already_used)?;

        Ok(EvaluatedPromo { promo, outcome })
    }

    /// Fire-and-forget notification after commit.
    fn publish(&self, event_type: &str, reservation: &Reservation, actor_user_id: DbId) {
        let event = ReservationEvent::new(
            event_type,
            reservation.id,
            reservation.space_id,
            reservation.user_id,
            actor_user_id,
        )
        .with_payload(json!({
            "starts_at": reservation.starts_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "ends_at": reservation.ends_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "gross_amount": reservation.gross_amount,
            "discount_amount": reservation.discount_amount,
            "amount_due": reservation.amount_due(),
        }));
        self.events.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = ?*stage, to = ?next, "Booking transaction stage");
    *stage = next;
}

/// Lock overlapping holding reservations and fail if there are any.
async fn ensure_window_free(
    conn: &mut PgConnection,
    space_id: DbId,
    starts_at: Timestamp,
    ends_at: Timestamp,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    let conflicts =
        ReservationRepo::lock_overlapping(conn, space_id, starts_at, ends_at, exclude_id).await?;
    if !conflicts.is_empty() {
        return Err(BookingError::ResourceUnavailable {
            space_id,
            reason: format!(
                "window overlaps {} existing reservation(s)",
                conflicts.len()
            ),
        }
        .into());
    }
    Ok(())
}

fn status_of(reservation: &Reservation) -> AppResult<ReservationStatus> {
    reservation.status().ok_or_else(|| {
        AppError::InternalError(format!(
            "reservation {} has unknown status id {}",
            reservation.id, reservation.status_id
        ))
    })
}

/// Re-read a reservation with its display fields inside the transaction.
async fn load_joined(
    conn: &mut PgConnection,
    reservation_id: DbId,
) -> AppResult<ReservationWithSpace> {
    ReservationRepo::find_with_space(conn, reservation_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!(
                "reservation {reservation_id} not visible in its own transaction"
            ))
        })
}
