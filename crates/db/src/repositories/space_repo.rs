//! Repository for the `spaces` table.
//!
//! The catalog is owned by space-management tooling; the booking engine only
//! reads it, locking the row it books against.

use cowork_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::space::{CreateSpace, Space};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, category, capacity, per_hour, per_half_day, \
    per_day, per_week, is_available, created_at, updated_at";

/// Provides catalog reads for spaces.
pub struct SpaceRepo;

impl SpaceRepo {
    /// Register a new space. Defaults `is_available` to `true`.
    pub async fn create(pool: &PgPool, input: &CreateSpace) -> Result<Space, sqlx::Error> {
        let query = format!(
            "INSERT INTO spaces
                (name, category, capacity, per_hour, per_half_day, per_day, per_week, is_available)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Space>(&query)
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.capacity)
            .bind(input.per_hour)
            .bind(input.per_half_day)
            .bind(input.per_day)
            .bind(input.per_week)
            .bind(input.is_available)
            .fetch_one(pool)
            .await
    }

    /// Find a space by its ID, whether or not it is currently available.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Space>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM spaces WHERE id = $1");
        sqlx::query_as::<_, Space>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List bookable spaces, optionally restricted to one category.
    /// Unavailable spaces are never returned.
    pub async fn list_available(
        pool: &PgPool,
        category: Option<&str>,
    ) -> Result<Vec<Space>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM spaces
             WHERE is_available = true AND ($1::TEXT IS NULL OR category = $1)
             ORDER BY category, name"
        );
        sqlx::query_as::<_, Space>(&query)
            .bind(category)
            .fetch_all(pool)
            .await
    }

    /// Load a space and lock its row for the rest of the transaction.
    ///
    /// Serializes every reservation write against the same space, including
    /// the case where no overlapping reservation row exists yet to lock.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Space>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM spaces WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Space>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Toggle the availability flag. Returns `true` if a row was updated.
    pub async fn set_available(
        pool: &PgPool,
        id: DbId,
        is_available: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE spaces SET is_available = $2 WHERE id = $1")
            .bind(id)
            .bind(is_available)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
