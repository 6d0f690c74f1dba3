//! Promo code eligibility rules and discount computation.
//!
//! The database layer locks and loads the code row; everything that decides
//! whether the code may be redeemed, and for how much, lives here so that
//! reservation creation and the standalone validation endpoint apply the
//! exact same rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, CoreError};
use crate::pricing::round_money;
use crate::types::{Money, Timestamp};

/// Category wildcard: a code carrying it applies to every space category.
pub const ALL_CATEGORIES: &str = "all";

/// How a promo code's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `discount_value` is a percentage of the gross amount.
    Percentage,
    /// `discount_value` is subtracted as-is.
    FixedAmount,
}

impl DiscountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
        }
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed_amount" => Ok(Self::FixedAmount),
            other => Err(format!("unknown discount type '{other}'")),
        }
    }
}

/// The redeemable terms of a promo code, as loaded from storage.
#[derive(Debug, Clone)]
pub struct PromoTerms {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Money,
    pub usage_count: i32,
    pub max_usage: Option<i32>,
    pub minimum_amount: Money,
    pub applicable_categories: Vec<String>,
}

/// Outcome of a successful promo evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoOutcome {
    pub discount: Money,
    pub final_amount: Money,
}

/// Canonical form of a user-entered code: trimmed, upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl PromoTerms {
    /// Whether the usage cap (if any) has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_usage
            .is_some_and(|max| self.usage_count >= max)
    }

    /// Whether the code applies to spaces of `category`.
    pub fn applies_to(&self, category: &str) -> bool {
        self.applicable_categories.is_empty()
            || self
                .applicable_categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(ALL_CATEGORIES) || c.eq_ignore_ascii_case(category))
    }

    /// Evaluate the code against a candidate gross `amount`.
    ///
    /// `already_used` must come from a lookup performed while the code row
    /// is locked. Checks run in a fixed order: usage cap, prior use by the
    /// same user, minimum amount, category.
    pub fn evaluate(
        &self,
        amount: Money,
        category: &str,
        already_used: bool,
    ) -> Result<PromoOutcome, BookingError> {
        if self.is_exhausted() {
            return Err(BookingError::PromoCodeExhausted {
                code: self.code.clone(),
            });
        }
        if already_used {
            return Err(BookingError::PromoCodeAlreadyUsed {
                code: self.code.clone(),
            });
        }
        if amount < self.minimum_amount {
            return Err(BookingError::PromoCodeMinimumNotMet {
                code: self.code.clone(),
                minimum: self.minimum_amount,
            });
        }
        if !self.applies_to(category) {
            return Err(BookingError::PromoCodeNotApplicable {
                code: self.code.clone(),
                category: category.to_string(),
            });
        }

        let discount = compute_discount(self.kind, self.value, amount);
        Ok(PromoOutcome {
            discount,
            final_amount: amount - discount,
        })
    }
}

/// Discount granted on `amount`, clamped to `[0, amount]`.
pub fn compute_discount(kind: DiscountKind, value: Money, amount: Money) -> Money {
    let raw = match kind {
        DiscountKind::Percentage => match amount.checked_mul(value) {
            Some(product) => round_money(product / Decimal::ONE_HUNDRED),
            // Scale down first; the result is clamped to `amount` below anyway.
            None => (amount / Decimal::ONE_HUNDRED)
                .checked_mul(value)
                .map_or(amount, round_money),
        },
        DiscountKind::FixedAmount => value,
    };
    clamp_discount(raw, amount)
}

/// Clamp a discount so it is never negative and never exceeds `amount`.
pub fn clamp_discount(discount: Money, amount: Money) -> Money {
    discount.max(Decimal::ZERO).min(amount.max(Decimal::ZERO))
}

/// Validate an admin-supplied promo code definition before it is stored.
pub fn validate_definition(
    code: &str,
    kind: DiscountKind,
    value: Money,
    valid_from: Timestamp,
    valid_until: Timestamp,
    max_usage: Option<i32>,
    minimum_amount: Option<Money>,
) -> Result<(), CoreError> {
    if normalize_code(code).is_empty() {
        return Err(CoreError::Validation("code must not be blank".into()));
    }
    if value <= Decimal::ZERO {
        return Err(CoreError::Validation("discount_value must be positive".into()));
    }
    if kind == DiscountKind::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(CoreError::Validation(
            "percentage discount_value must not exceed 100".into(),
        ));
    }
    if valid_until <= valid_from {
        return Err(CoreError::Validation(
            "valid_until must be after valid_from".into(),
        ));
    }
    if max_usage.is_some_and(|max| max < 1) {
        return Err(CoreError::Validation("max_usage must be at least 1".into()));
    }
    if minimum_amount.is_some_and(|min| min < Decimal::ZERO) {
        return Err(CoreError::Validation(
            "minimum_amount must not be negative".into(),
        ));
    }
    Ok(())
}
