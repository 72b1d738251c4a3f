//! Running and final cost.
//!
//! Running cost uses fractional elapsed minutes; final cost uses the
//! whole-minute actual duration recorded at close. Both round half-up to
//! whole currency units. Fixed sessions always cost the price snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use rentflow_entity::pricing::BillingType;

const MINUTES_PER_HOUR: i64 = 60;
const MS_PER_MINUTE: i64 = 60_000;

/// Round half-up to whole currency units.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Fractional minutes between `started_at` and `now`, never negative.
pub fn elapsed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    let ms = (now - started_at).num_milliseconds().max(0);
    Decimal::from(ms) / Decimal::from(MS_PER_MINUTE)
}

/// Whole minutes between two instants, rounded half-up.
pub fn whole_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i32 {
    round_currency(elapsed_minutes(started_at, ended_at))
        .to_i32()
        .unwrap_or(i32::MAX)
}

/// `max(elapsed, min_duration)`.
pub fn billable_minutes(elapsed: Decimal, min_duration: Option<i32>) -> Decimal {
    match min_duration {
        Some(min) => elapsed.max(Decimal::from(min.max(0))),
        None => elapsed,
    }
}

fn cost_for_minutes(
    minutes: Decimal,
    price: Decimal,
    billing_type: BillingType,
    units: Option<i32>,
) -> Decimal {
    match billing_type {
        BillingType::PerHour => round_currency(minutes * price / Decimal::from(MINUTES_PER_HOUR)),
        BillingType::PerMinute => round_currency(minutes * price),
        BillingType::Fixed => price,
        BillingType::PerGame => price * Decimal::from(units.unwrap_or(1).max(0)),
    }
}

/// Cost of an active session as of `now`.
///
/// `units` defaults to one game for per-game billing.
pub fn compute_running_cost(
    started_at: DateTime<Utc>,
    price_snapshot: Decimal,
    billing_type: BillingType,
    now: DateTime<Utc>,
    units: Option<i32>,
    min_duration: Option<i32>,
) -> Decimal {
    let minutes = billable_minutes(elapsed_minutes(started_at, now), min_duration);
    cost_for_minutes(minutes, price_snapshot, billing_type, units)
}

/// Cost at close from the whole-minute actual duration.
pub fn compute_final_cost(
    actual_duration: i32,
    price_snapshot: Decimal,
    billing_type: BillingType,
    units: Option<i32>,
    min_duration: Option<i32>,
) -> Decimal {
    let minutes = billable_minutes(Decimal::from(actual_duration.max(0)), min_duration);
    cost_for_minutes(minutes, price_snapshot, billing_type, units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn ten_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_per_hour_half_hour() {
        let start = ten_am();
        let cost = compute_running_cost(
            start,
            dec!(10000),
            BillingType::PerHour,
            start + Duration::minutes(30),
            None,
            None,
        );
        assert_eq!(cost, dec!(5000));
        assert_eq!(compute_final_cost(30, dec!(10000), BillingType::PerHour, None, None), dec!(5000));
    }

    #[test]
    fn test_per_minute_long_session() {
        assert_eq!(
            compute_final_cost(125, dec!(100), BillingType::PerMinute, None, None),
            dec!(12500)
        );
    }

    #[test]
    fn test_running_cost_uses_fractional_minutes() {
        let start = ten_am();
        // 90 seconds at 100/min is 150.
        let cost = compute_running_cost(
            start,
            dec!(100),
            BillingType::PerMinute,
            start + Duration::seconds(90),
            None,
            None,
        );
        assert_eq!(cost, dec!(150));

        // 1 minute at 10000/h is 166.67, rounds to 167.
        let cost = compute_running_cost(
            start,
            dec!(10000),
            BillingType::PerHour,
            start + Duration::minutes(1),
            None,
            None,
        );
        assert_eq!(cost, dec!(167));
    }

    #[test]
    fn test_fixed_ignores_elapsed_time() {
        let start = ten_am();
        let cost = compute_running_cost(
            start,
            dec!(20000),
            BillingType::Fixed,
            start + Duration::minutes(10),
            None,
            Some(60),
        );
        assert_eq!(cost, dec!(20000));
    }

    #[test]
    fn test_minimum_duration_floor() {
        assert_eq!(
            compute_final_cost(10, dec!(6000), BillingType::PerHour, None, Some(30)),
            dec!(3000)
        );
        assert_eq!(
            compute_final_cost(45, dec!(6000), BillingType::PerHour, None, Some(30)),
            dec!(4500)
        );
    }

    #[test]
    fn test_per_game_units() {
        assert_eq!(compute_final_cost(5, dec!(2500), BillingType::PerGame, Some(3), None), dec!(7500));
        assert_eq!(compute_final_cost(5, dec!(2500), BillingType::PerGame, None, None), dec!(2500));
    }

    #[test]
    fn test_whole_minutes_round_half_up() {
        let start = ten_am();
        assert_eq!(whole_minutes(start, start + Duration::seconds(29)), 0);
        assert_eq!(whole_minutes(start, start + Duration::seconds(30)), 1);
        assert_eq!(whole_minutes(start, start + Duration::seconds(150)), 3);
        assert_eq!(whole_minutes(start, start - Duration::minutes(5)), 0);
    }
}
