//! Effective-price computation for a product.
//!
//! A product may have any number of associated discounts; at most one is ever
//! applied. A discount is eligible when it is active and the evaluation
//! instant falls inside its `[start_date, end_date]` window. Expiry is a pure
//! function of the clock, nothing is written back when a window closes.
//!
//! When several discounts are eligible at the same instant the one with the
//! smallest id wins. That is a policy choice for determinism, not a business
//! rule; see DESIGN.md.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Discount;

pub const PERCENTAGE: &str = "percentage";
pub const FIXED: &str = "fixed";

pub fn is_valid_discount_type(discount_type: &str) -> bool {
    discount_type == PERCENTAGE || discount_type == FIXED
}

/// Pick the single discount applied to a product at `now`, if any.
/// Deterministic: smallest id among the eligible discounts.
pub fn select_discount<'a>(discounts: &'a [Discount], now: DateTime<Utc>) -> Option<&'a Discount> {
    discounts
        .iter()
        .filter(|d| d.active && d.start_date <= now && now <= d.end_date)
        .min_by_key(|d| d.id)
}

/// Price a buyer pays for `list_price` at `now`, with at most one eligible
/// discount applied. Never negative, rounded to 2 decimal places half-up at
/// the final step only.
pub fn effective_price(list_price: Decimal, discounts: &[Discount], now: DateTime<Utc>) -> Decimal {
    let price = match select_discount(discounts, now) {
        Some(discount) => apply_discount(list_price, discount),
        None => list_price,
    };
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// A persisted value outside its legal range is refused here rather than
// trusted: creation-time validation is the primary guard, but the resolver
// must not produce a negative or undefined price from bad stored data.
fn apply_discount(list_price: Decimal, discount: &Discount) -> Decimal {
    match discount.discount_type.as_str() {
        PERCENTAGE
            if discount.value >= Decimal::ZERO && discount.value <= Decimal::ONE_HUNDRED =>
        {
            list_price * (Decimal::ONE - discount.value / Decimal::ONE_HUNDRED)
        }
        FIXED if discount.value >= Decimal::ZERO => {
            (list_price - discount.value).max(Decimal::ZERO)
        }
        _ => list_price,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn discount(discount_type: &str, value: &str, active: bool, now: DateTime<Utc>) -> Discount {
        Discount {
            id: Uuid::new_v4(),
            name: "test".into(),
            discount_type: discount_type.into(),
            value: dec(value),
            start_date: now - Duration::hours(1),
            end_date: now + Duration::hours(1),
            active,
            created_at: now,
        }
    }

    #[test]
    fn no_discounts_yields_list_price() {
        let now = Utc::now();
        assert_eq!(effective_price(dec("100.00"), &[], now), dec("100.00"));
    }

    #[test]
    fn percentage_discount_applies() {
        let now = Utc::now();
        let d = discount(PERCENTAGE, "10", true, now);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("90.00"));
    }

    #[test]
    fn fixed_discount_floors_at_zero() {
        let now = Utc::now();
        let d = discount(FIXED, "150", true, now);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("0.00"));
    }

    #[test]
    fn fixed_discount_subtracts() {
        let now = Utc::now();
        let d = discount(FIXED, "25.50", true, now);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("74.50"));
    }

    #[test]
    fn inactive_discount_is_ignored() {
        let now = Utc::now();
        let d = discount(PERCENTAGE, "10", false, now);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("100.00"));
    }

    #[test]
    fn expired_discount_is_ignored() {
        let now = Utc::now();
        let mut d = discount(PERCENTAGE, "10", true, now);
        d.start_date = now - Duration::days(2);
        d.end_date = now - Duration::days(1);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("100.00"));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut d = discount(PERCENTAGE, "10", true, now);
        d.start_date = now;
        d.end_date = now;
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("90.00"));
    }

    #[test]
    fn future_discount_is_ignored() {
        let now = Utc::now();
        let mut d = discount(PERCENTAGE, "10", true, now);
        d.start_date = now + Duration::hours(1);
        d.end_date = now + Duration::hours(2);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("100.00"));
    }

    #[test]
    fn out_of_range_percentage_falls_back_to_list_price() {
        let now = Utc::now();
        let over = discount(PERCENTAGE, "150", true, now);
        assert_eq!(effective_price(dec("100.00"), &[over], now), dec("100.00"));

        let negative = discount(PERCENTAGE, "-5", true, now);
        assert_eq!(
            effective_price(dec("100.00"), &[negative], now),
            dec("100.00")
        );
    }

    #[test]
    fn negative_fixed_value_falls_back_to_list_price() {
        let now = Utc::now();
        let d = discount(FIXED, "-5", true, now);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("100.00"));
    }

    #[test]
    fn unknown_discount_type_falls_back_to_list_price() {
        let now = Utc::now();
        let d = discount("bogo", "10", true, now);
        assert_eq!(effective_price(dec("100.00"), &[d], now), dec("100.00"));
    }

    #[test]
    fn rounds_half_up_at_final_step_only() {
        let now = Utc::now();
        // 9.99 * (1 - 1/3 of 1%) style case: 33.33% off 9.99 = 6.661...
        let d = discount(PERCENTAGE, "33.33", true, now);
        assert_eq!(effective_price(dec("9.99"), &[d], now), dec("6.66"));

        // 12.5% off 0.10 = 0.0875 -> 0.09 with half-up rounding.
        let d = discount(PERCENTAGE, "12.5", true, now);
        assert_eq!(effective_price(dec("0.10"), &[d], now), dec("0.09"));
    }

    #[test]
    fn effective_price_is_never_negative() {
        let now = Utc::now();
        for value in ["0", "50", "100", "150", "99999"] {
            for kind in [PERCENTAGE, FIXED] {
                let d = discount(kind, value, true, now);
                assert!(effective_price(dec("19.99"), &[d], now) >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn selection_is_deterministic_across_calls() {
        let now = Utc::now();
        let a = discount(PERCENTAGE, "10", true, now);
        let b = discount(FIXED, "30", true, now);
        let discounts = vec![a, b];
        let expected_id = discounts.iter().map(|d| d.id).min().unwrap();

        for _ in 0..10 {
            let picked = select_discount(&discounts, now).unwrap();
            assert_eq!(picked.id, expected_id);
        }

        // Order of the input slice does not change the outcome.
        let reversed: Vec<Discount> = discounts.iter().rev().cloned().collect();
        assert_eq!(select_discount(&reversed, now).unwrap().id, expected_id);
    }

    #[test]
    fn only_eligible_discounts_compete() {
        let now = Utc::now();
        let mut inactive = discount(PERCENTAGE, "50", false, now);
        let eligible = discount(PERCENTAGE, "10", true, now);
        // Force the ineligible discount to have the smaller id.
        inactive.id = Uuid::nil();
        let price = effective_price(dec("100.00"), &[inactive, eligible], now);
        assert_eq!(price, dec("90.00"));
    }
}
