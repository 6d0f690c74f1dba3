//! Promo code entity model and DTOs.

use cowork_core::error::CoreError;
use cowork_core::promo::{DiscountKind, PromoTerms};
use cowork_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `promo_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromoCode {
    pub id: DbId,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Money,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    pub usage_count: i32,
    pub max_usage: Option<i32>,
    pub minimum_amount: Money,
    pub applicable_categories: Vec<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PromoCode {
    /// Redemption terms for rule evaluation.
    ///
    /// Fails only if the stored `discount_type` is outside the known set,
    /// which the table's CHECK constraint prevents.
    pub fn terms(&self) -> Result<PromoTerms, CoreError> {
        let kind = self
            .discount_type
            .parse::<DiscountKind>()
            .map_err(CoreError::Internal)?;
        Ok(PromoTerms {
            code: self.code.clone(),
            kind,
            value: self.discount_value,
            usage_count: self.usage_count,
            max_usage: self.max_usage,
            minimum_amount: self.minimum_amount,
            applicable_categories: self.applicable_categories.clone(),
        })
    }
}

/// DTO for creating a promo code. `code` is normalized to upper case on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromoCode {
    pub code: String,
    pub discount_type: DiscountKind,
    pub discount_value: Money,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    pub max_usage: Option<i32>,
    pub minimum_amount: Option<Money>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    pub is_active: Option<bool>,
}
