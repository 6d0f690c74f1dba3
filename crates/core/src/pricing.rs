//! Tiered price calculation for space reservations.
//!
//! [`calculate_price`] is the single source of truth for how much a
//! reservation costs. It is used when a reservation is created, when its
//! window is amended, and by the quote endpoint.

use chrono::TimeDelta;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, CoreError};
use crate::types::{Money, Timestamp};

/// Seconds in one billable hour.
pub const SECS_PER_HOUR: i64 = 3_600;
/// Seconds in one billable day.
pub const SECS_PER_DAY: i64 = 86_400;
/// Days in one billable week.
pub const DAYS_PER_WEEK: i64 = 7;
/// Decimal places of the smallest currency unit.
pub const MONEY_SCALE: u32 = 2;
/// Largest amount a `NUMERIC(12,2)` column holds.
pub const MAX_MONEY: Money = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE); // 999_999_999_999 scaled by MONEY_SCALE

/// Per-unit prices of a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub per_hour: Money,
    pub per_half_day: Option<Money>,
    pub per_day: Money,
    pub per_week: Option<Money>,
}

impl RateCard {
    /// Reject negative prices in a catalog entry.
    pub fn validate(&self) -> Result<(), CoreError> {
        let rates = [
            ("per_hour", Some(self.per_hour)),
            ("per_half_day", self.per_half_day),
            ("per_day", Some(self.per_day)),
            ("per_week", self.per_week),
        ];
        for (name, rate) in rates {
            if rate.is_some_and(|r| r < Decimal::ZERO) {
                return Err(CoreError::Validation(format!("{name} must not be negative")));
            }
        }
        Ok(())
    }
}

/// Billing unit selected for a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    Hour,
    Day,
    Week,
}

impl PricingUnit {
    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl std::str::FromStr for PricingUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(format!("unknown pricing unit '{other}'")),
        }
    }
}

/// Result of pricing a window against a rate card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub amount: Money,
    pub unit: PricingUnit,
}

/// Round a monetary amount half-up to the smallest currency unit.
pub fn round_money(amount: Decimal) -> Money {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate that a window is non-empty and ordered.
pub fn validate_window(starts_at: Timestamp, ends_at: Timestamp) -> Result<(), BookingError> {
    if ends_at <= starts_at {
        return Err(BookingError::InvalidWindow);
    }
    Ok(())
}

/// Price the window `[starts_at, ends_at)` using `rates`.
///
/// - Under 24 hours: every started hour is billed at `per_hour`.
/// - Otherwise every started day is billed. From 7 days on, if the space has
///   a positive weekly rate, full weeks are billed at `per_week` and the
///   remaining days at `per_day`.
pub fn calculate_price(
    rates: &RateCard,
    starts_at: Timestamp,
    ends_at: Timestamp,
) -> Result<PriceQuote, BookingError> {
    validate_window(starts_at, ends_at)?;

    let duration = ends_at - starts_at;

    if duration < TimeDelta::hours(24) {
        let hours = ceil_units(duration, SECS_PER_HOUR);
        return Ok(PriceQuote {
            amount: round_money(Decimal::from(hours) * rates.per_hour),
            unit: PricingUnit::Hour,
        });
    }

    let days = ceil_units(duration, SECS_PER_DAY);
    let weekly = rates.per_week.filter(|rate| *rate > Decimal::ZERO);

    let quote = match weekly {
        Some(per_week) if days >= DAYS_PER_WEEK => {
            let weeks = days / DAYS_PER_WEEK;
            let remainder = days % DAYS_PER_WEEK;
            let amount =
                Decimal::from(weeks) * per_week + Decimal::from(remainder) * rates.per_day;
            PriceQuote {
                amount: round_money(amount),
                unit: if weeks > 0 {
                    PricingUnit::Week
                } else {
                    PricingUnit::Day
                },
            }
        }
        _ => PriceQuote {
            amount: round_money(Decimal::from(days) * rates.per_day),
            unit: PricingUnit::Day,
        },
    };

    Ok(quote)
}

/// Number of started `unit_secs` periods in `duration`, rounding up.
fn ceil_units(duration: TimeDelta, unit_secs: i64) -> i64 {
    // Any sub-second remainder counts as one more started second.
    let secs = duration.num_seconds() + i64::from(duration.subsec_nanos() > 0);
    (secs + unit_secs - 1) / unit_secs
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn rates() -> RateCard {
        RateCard {
            per_hour: dec!(500),
            per_half_day: Some(dec!(1800)),
            per_day: dec!(1000),
            per_week: Some(dec!(6000)),
        }
    }

    #[test]
    fn ninety_minutes_bills_two_hours() {
        let quote = calculate_price(&rates(), start(), start() + Duration::minutes(90)).unwrap();
        assert_eq!(quote.amount, dec!(1000));
        assert_eq!(quote.unit, PricingUnit::Hour);
    }

    #[test]
    fn one_minute_bills_a_full_hour() {
        let quote = calculate_price(&rates(), start(), start() + Duration::minutes(1)).unwrap();
        assert_eq!(quote.amount, dec!(500));
    }

    #[test]
    fn exact_hours_are_not_rounded_up() {
        let quote = calculate_price(&rates(), start(), start() + Duration::hours(3)).unwrap();
        assert_eq!(quote.amount, dec!(1500));
    }

    #[test]
    fn sub_second_remainder_starts_a_new_hour() {
        let end = start() + Duration::hours(1) + Duration::milliseconds(1);
        let quote = calculate_price(&rates(), start(), end).unwrap();
        assert_eq!(quote.amount, dec!(1000));
    }

    #[test]
    fn just_under_a_day_is_hourly() {
        let end = start() + Duration::hours(23) + Duration::minutes(59);
        let quote = calculate_price(&rates(), start(), end).unwrap();
        assert_eq!(quote.unit, PricingUnit::Hour);
        assert_eq!(quote.amount, dec!(12000));
    }

    #[test]
    fn exactly_one_day_is_daily() {
        let quote = calculate_price(&rates(), start(), start() + Duration::hours(24)).unwrap();
        assert_eq!(quote.unit, PricingUnit::Day);
        assert_eq!(quote.amount, dec!(1000));
    }

    #[test]
    fn partial_days_round_up() {
        let quote = calculate_price(&rates(), start(), start() + Duration::hours(25)).unwrap();
        assert_eq!(quote.unit, PricingUnit::Day);
        assert_eq!(quote.amount, dec!(2000));
    }

    #[test]
    fn ten_days_bills_one_week_and_three_days() {
        let quote = calculate_price(&rates(), start(), start() + Duration::days(10)).unwrap();
        assert_eq!(quote.amount, dec!(9000));
        assert_eq!(quote.unit, PricingUnit::Week);
    }

    #[test]
    fn exactly_one_week() {
        let quote = calculate_price(&rates(), start(), start() + Duration::days(7)).unwrap();
        assert_eq!(quote.amount, dec!(6000));
        assert_eq!(quote.unit, PricingUnit::Week);
    }

    #[test]
    fn missing_weekly_rate_falls_back_to_days() {
        let mut card = rates();
        card.per_week = None;
        let quote = calculate_price(&card, start(), start() + Duration::days(10)).unwrap();
        assert_eq!(quote.amount, dec!(10000));
        assert_eq!(quote.unit, PricingUnit::Day);
    }

    #[test]
    fn zero_weekly_rate_falls_back_to_days() {
        let mut card = rates();
        card.per_week = Some(Decimal::ZERO);
        let quote = calculate_price(&card, start(), start() + Duration::days(8)).unwrap();
        assert_eq!(quote.amount, dec!(8000));
        assert_eq!(quote.unit, PricingUnit::Day);
    }

    #[test]
    fn fractional_rates_round_half_up() {
        let card = RateCard {
            per_hour: dec!(12.345),
            per_half_day: None,
            per_day: dec!(0),
            per_week: None,
        };
        let quote = calculate_price(&card, start(), start() + Duration::hours(1)).unwrap();
        assert_eq!(quote.amount, dec!(12.35));
    }

    #[test]
    fn empty_or_reversed_window_is_rejected() {
        assert_matches!(
            calculate_price(&rates(), start(), start()),
            Err(BookingError::InvalidWindow)
        );
        assert_matches!(
            calculate_price(&rates(), start(), start() - Duration::hours(1)),
            Err(BookingError::InvalidWindow)
        );
    }

    #[test]
    fn pricing_is_deterministic() {
        let end = start() + Duration::days(15) + Duration::hours(3);
        let first = calculate_price(&rates(), start(), end).unwrap();
        let second = calculate_price(&rates(), start(), end).unwrap();
        assert_eq!(first, second);
        // 16 started days = 2 weeks + 2 days.
        assert_eq!(first.amount, dec!(14000));
    }

    #[test]
    fn pricing_unit_round_trips_through_str() {
        for unit in [PricingUnit::Hour, PricingUnit::Day, PricingUnit::Week] {
            assert_eq!(unit.as_str().parse::<PricingUnit>().unwrap(), unit);
        }
        assert!("month".parse::<PricingUnit>().is_err());
    }

    #[test]
    fn negative_rates_are_rejected() {
        assert!(rates().validate().is_ok());
        let mut bad = rates();
        bad.per_week = Some(dec!(-1));
        assert_matches!(bad.validate(), Err(CoreError::Validation(msg)) if msg.contains("per_week"));
    }

    #[test]
    fn money_ceiling_matches_column_precision() {
        assert_eq!(MAX_MONEY, dec!(9999999999.99));
    }
}
