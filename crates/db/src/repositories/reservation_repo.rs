//! Repository for the `reservations` table.

use cowork_core::reservation::{holding_status_ids, ReservationStatus};
use cowork_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::reservation::{
    NewReservation, Reservation, ReservationWindowUpdate, ReservationWithSpace,
};

/// Column list for plain `reservations` queries.
const COLUMNS: &str = "id, space_id, user_id, starts_at, ends_at, status_id, pricing_unit, \
    gross_amount, discount_amount, amount_paid, promo_code_id, participant_count, notes, \
    created_at, updated_at";

/// Select list for [`ReservationWithSpace`]; expects aliases `r`, `s`, `rs`.
const JOINED_COLUMNS: &str = "r.id, r.space_id, r.user_id, r.starts_at, r.ends_at, r.status_id, \
    r.pricing_unit, r.gross_amount, r.discount_amount, r.amount_paid, r.promo_code_id, \
    r.participant_count, r.notes, r.created_at, r.updated_at, \
    rs.name AS status, s.name AS space_name, s.category AS space_category";

/// Join clause matching [`JOINED_COLUMNS`].
const JOINED_FROM: &str = "reservations r \
    JOIN spaces s ON s.id = r.space_id \
    JOIN reservation_statuses rs ON rs.id = r.status_id";

/// Half-open overlap of a stored row against `[$2, $3)`.
const OVERLAP_PREDICATE: &str = "NOT (ends_at <= $2 OR starts_at >= $3)";

/// Provides reservation reads and the engine's transactional writes.
pub struct ReservationRepo;

impl ReservationRepo {
    // ── Transactional operations ─────────────────────────────────────

    /// Lock every holding reservation of `space_id` that overlaps
    /// `[starts_at, ends_at)`.
    ///
    /// `exclude_id` skips the reservation being amended. An empty result
    /// means the window is free for as long as the enclosing transaction
    /// holds the space row lock.
    pub async fn lock_overlapping(
        conn: &mut PgConnection,
        space_id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
        exclude_id: Option<DbId>,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations
             WHERE space_id = $1
               AND {OVERLAP_PREDICATE}
               AND status_id = ANY($4)
               AND ($5::BIGINT IS NULL OR id <> $5)
             ORDER BY id
             FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, Reservation>(&query)
            .bind(space_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(holding_status_ids())
            .bind(exclude_id)
            .fetch_all(conn)
            .await?;
        if !rows.is_empty() {
            tracing::debug!(
                space_id,
                conflicts = rows.len(),
                "Overlapping reservations locked"
            );
        }
        Ok(rows)
    }

    /// Insert a new `pending` reservation with engine-computed amounts.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewReservation,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "INSERT INTO reservations
                (space_id, user_id, starts_at, ends_at, status_id, pricing_unit,
                 gross_amount, discount_amount, amount_paid, promo_code_id,
                 participant_count, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(input.space_id)
            .bind(input.user_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(ReservationStatus::Pending.id())
            .bind(&input.pricing_unit)
            .bind(input.gross_amount)
            .bind(input.discount_amount)
            .bind(input.promo_code_id)
            .bind(input.participant_count)
            .bind(&input.notes)
            .fetch_one(conn)
            .await
    }

    /// Load a reservation and lock its row for the rest of the transaction.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Apply a window amendment. Only the columns of
    /// [`ReservationWindowUpdate`] are ever written.
    pub async fn update_window(
        conn: &mut PgConnection,
        id: DbId,
        input: &ReservationWindowUpdate,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET
                starts_at = $2,
                ends_at = $3,
                pricing_unit = $4,
                gross_amount = $5,
                discount_amount = $6
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(&input.pricing_unit)
            .bind(input.gross_amount)
            .bind(input.discount_amount)
            .fetch_one(conn)
            .await
    }

    /// Set the lifecycle status of a reservation.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: ReservationStatus,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(conn)
            .await
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Find a reservation with its space display fields.
    ///
    /// Accepts either the pool or an open transaction so the engine can
    /// return rows it has not committed yet.
    pub async fn find_with_space<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<ReservationWithSpace>, sqlx::Error> {
        let query = format!("SELECT {JOINED_COLUMNS} FROM {JOINED_FROM} WHERE r.id = $1");
        sqlx::query_as::<_, ReservationWithSpace>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a reservation by its ID without locking it.
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List reservations, newest window first. `user_id = None` lists all.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReservationWithSpace>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM {JOINED_FROM}
             WHERE ($1::BIGINT IS NULL OR r.user_id = $1)
             ORDER BY r.starts_at DESC, r.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ReservationWithSpace>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Holding reservations of a space overlapping `[starts_at, ends_at)`,
    /// without taking locks. Advisory only: a concurrent writer may book
    /// the window right after this returns.
    pub async fn find_overlapping(
        pool: &PgPool,
        space_id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations
             WHERE space_id = $1
               AND {OVERLAP_PREDICATE}
               AND status_id = ANY($4)
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(space_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(holding_status_ids())
            .fetch_all(pool)
            .await
    }

    /// Count reservations of a space, in any status.
    pub async fn count_for_space(pool: &PgPool, space_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservations WHERE space_id = $1")
            .bind(space_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
