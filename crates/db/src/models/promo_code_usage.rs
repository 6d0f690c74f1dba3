//! Promo code redemption records.

use cowork_core::types::{DbId, Money, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `promo_code_usages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromoCodeUsage {
    pub id: DbId,
    pub promo_code_id: DbId,
    pub user_id: DbId,
    pub reservation_id: DbId,
    pub discount_amount: Money,
    pub amount_before: Money,
    pub amount_after: Money,
    pub used_at: Timestamp,
}

/// Insert payload for a redemption, written inside the reservation transaction.
#[derive(Debug, Clone)]
pub struct NewPromoCodeUsage {
    pub promo_code_id: DbId,
    pub user_id: DbId,
    pub reservation_id: DbId,
    pub discount_amount: Money,
    pub amount_before: Money,
    pub amount_after: Money,
}
