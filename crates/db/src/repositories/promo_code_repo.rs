//! Repository for the `promo_codes` table.

use cowork_core::promo::normalize_code;
use cowork_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::promo_code::{CreatePromoCode, PromoCode};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, code, discount_type, discount_value, valid_from, valid_until, \
    usage_count, max_usage, minimum_amount, applicable_categories, is_active, \
    created_at, updated_at";

/// Active codes whose validity window contains the transaction time.
const REDEEMABLE_FILTER: &str =
    "code = $1 AND is_active = true AND NOW() BETWEEN valid_from AND valid_until";

/// Provides management writes and redemption locks for promo codes.
pub struct PromoCodeRepo;

impl PromoCodeRepo {
    /// Insert a new promo code. The code is stored trimmed and upper-cased.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePromoCode,
    ) -> Result<PromoCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO promo_codes
                (code, discount_type, discount_value, valid_from, valid_until,
                 max_usage, minimum_amount, applicable_categories, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), $8, COALESCE($9, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromoCode>(&query)
            .bind(normalize_code(&input.code))
            .bind(input.discount_type.as_str())
            .bind(input.discount_value)
            .bind(input.valid_from)
            .bind(input.valid_until)
            .bind(input.max_usage)
            .bind(input.minimum_amount)
            .bind(&input.applicable_categories)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a promo code by ID, regardless of state.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PromoCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM promo_codes WHERE id = $1");
        sqlx::query_as::<_, PromoCode>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load a redeemable code and lock its row exclusively.
    ///
    /// Concurrent redemptions of the same code queue behind this lock, so the
    /// usage-cap check, the per-user check and the counter increment that
    /// follow in the same transaction cannot interleave.
    pub async fn lock_redeemable(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<PromoCode>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM promo_codes WHERE {REDEEMABLE_FILTER} FOR UPDATE");
        sqlx::query_as::<_, PromoCode>(&query)
            .bind(normalize_code(code))
            .fetch_optional(conn)
            .await
    }

    /// Load a redeemable code under a shared lock, for read-only validation.
    ///
    /// Blocks while a redemption holds the row, so the answer reflects
    /// committed usage counts.
    pub async fn share_lock_redeemable(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<PromoCode>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM promo_codes WHERE {REDEEMABLE_FILTER} FOR SHARE");
        sqlx::query_as::<_, PromoCode>(&query)
            .bind(normalize_code(code))
            .fetch_optional(conn)
            .await
    }

    /// Consume one use of a code. Must run under [`Self::lock_redeemable`].
    /// Returns the new usage count.
    pub async fn increment_usage(conn: &mut PgConnection, id: DbId) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "UPDATE promo_codes SET usage_count = usage_count + 1 \
             WHERE id = $1 RETURNING usage_count",
        )
        .bind(id)
        .fetch_one(conn)
        .await?;
        tracing::debug!(promo_code_id = id, usage_count = row.0, "Promo code usage incremented");
        Ok(row.0)
    }
}
