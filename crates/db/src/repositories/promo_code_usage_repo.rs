//! Repository for the `promo_code_usages` table.

use cowork_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::promo_code_usage::{NewPromoCodeUsage, PromoCodeUsage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, promo_code_id, user_id, reservation_id, discount_amount, \
    amount_before, amount_after, used_at";

/// Provides redemption bookkeeping.
pub struct PromoCodeUsageRepo;

impl PromoCodeUsageRepo {
    /// Whether `user_id` has already redeemed `promo_code_id`.
    ///
    /// Only meaningful while the promo code row is locked by the same
    /// transaction.
    pub async fn exists_for_user(
        conn: &mut PgConnection,
        promo_code_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM promo_code_usages WHERE promo_code_id = $1 AND user_id = $2 \
             )",
        )
        .bind(promo_code_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Record a redemption.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewPromoCodeUsage,
    ) -> Result<PromoCodeUsage, sqlx::Error> {
        let query = format!(
            "INSERT INTO promo_code_usages
                (promo_code_id, user_id, reservation_id, discount_amount, amount_before, amount_after)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromoCodeUsage>(&query)
            .bind(input.promo_code_id)
            .bind(input.user_id)
            .bind(input.reservation_id)
            .bind(input.discount_amount)
            .bind(input.amount_before)
            .bind(input.amount_after)
            .fetch_one(conn)
            .await
    }

    /// The redemption attached to a reservation, if any.
    pub async fn find_by_reservation(
        pool: &PgPool,
        reservation_id: DbId,
    ) -> Result<Option<PromoCodeUsage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM promo_code_usages WHERE reservation_id = $1");
        sqlx::query_as::<_, PromoCodeUsage>(&query)
            .bind(reservation_id)
            .fetch_optional(pool)
            .await
    }

    /// All redemptions of a code, oldest first.
    pub async fn list_by_code(
        pool: &PgPool,
        promo_code_id: DbId,
    ) -> Result<Vec<PromoCodeUsage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM promo_code_usages WHERE promo_code_id = $1 ORDER BY used_at, id"
        );
        sqlx::query_as::<_, PromoCodeUsage>(&query)
            .bind(promo_code_id)
            .fetch_all(pool)
            .await
    }
}
