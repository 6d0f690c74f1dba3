//! Space (bookable resource) entity model and DTOs.

use cowork_core::pricing::RateCard;
use cowork_core::types::{DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `spaces` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Space {
    pub id: DbId,
    pub name: String,
    pub category: String,
    pub capacity: i32,
    pub per_hour: Money,
    pub per_half_day: Option<Money>,
    pub per_day: Money,
    pub per_week: Option<Money>,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Space {
    /// The space's own prices. The only input to reservation pricing.
    pub fn rate_card(&self) -> RateCard {
        RateCard {
            per_hour: self.per_hour,
            per_half_day: self.per_half_day,
            per_day: self.per_day,
            per_week: self.per_week,
        }
    }
}

/// DTO for registering a space in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpace {
    pub name: String,
    pub category: String,
    pub capacity: i32,
    pub per_hour: Money,
    pub per_half_day: Option<Money>,
    pub per_day: Money,
    pub per_week: Option<Money>,
    pub is_available: Option<bool>,
}
