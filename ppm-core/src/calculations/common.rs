//! Shared helpers for money and weight arithmetic.
//!
//! Rounding and display formatting used by the incentive and entitlement
//! calculations, and by any front end that renders their results.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a dollar amount to whole cents using half-up rounding.
///
/// Values at exactly half a cent round away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use ppm_core::calculations::common::round_to_cents;
///
/// assert_eq!(round_to_cents(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_to_cents(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_to_cents(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Groups the digits of an integer in threes with commas.
///
/// # Examples
///
/// ```
/// use ppm_core::calculations::common::format_thousands;
///
/// assert_eq!(format_thousands(5000), "5,000");
/// assert_eq!(format_thousands(-1234567), "-1,234,567");
/// assert_eq!(format_thousands(999), "999");
/// ```
pub fn format_thousands(value: i64) -> String {
    let grouped = group_digits(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats a dollar amount with thousands separators and exactly two
/// decimal places, e.g. `4,275.00`. No currency symbol is added.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use ppm_core::calculations::common::format_dollars;
///
/// assert_eq!(format_dollars(dec!(4275)), "4,275.00");
/// assert_eq!(format_dollars(dec!(0.5)), "0.50");
/// ```
pub fn format_dollars(value: Decimal) -> String {
    let total_cents = (round_to_cents(value) * Decimal::ONE_HUNDRED)
        .to_i128()
        .unwrap_or_default();
    let whole = group_digits(&(total_cents.unsigned_abs() / 100).to_string());
    let cents = total_cents.unsigned_abs() % 100;
    let sign = if total_cents < 0 { "-" } else { "" };

    format!("{sign}{whole}.{cents:02}")
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_to_cents tests
    // =========================================================================

    #[test]
    fn round_to_cents_rounds_down_below_midpoint() {
        assert_eq!(round_to_cents(dec!(123.454)), dec!(123.45));
    }

    #[test]
    fn round_to_cents_rounds_up_at_midpoint() {
        assert_eq!(round_to_cents(dec!(123.455)), dec!(123.46));
    }

    #[test]
    fn round_to_cents_handles_negative_values() {
        assert_eq!(round_to_cents(dec!(-123.455)), dec!(-123.46));
    }

    #[test]
    fn round_to_cents_handles_small_values() {
        assert_eq!(round_to_cents(dec!(0.001)), dec!(0.00));
    }

    // =========================================================================
    // format_thousands tests
    // =========================================================================

    #[test]
    fn format_thousands_leaves_short_numbers_alone() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(42), "42");
        assert_eq!(format_thousands(999), "999");
    }

    #[test]
    fn format_thousands_groups_digits() {
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(18000), "18,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn format_thousands_keeps_sign() {
        assert_eq!(format_thousands(-4500), "-4,500");
    }

    // =========================================================================
    // format_dollars tests
    // =========================================================================

    #[test]
    fn format_dollars_pads_cents() {
        assert_eq!(format_dollars(dec!(12)), "12.00");
        assert_eq!(format_dollars(dec!(12.3)), "12.30");
    }

    #[test]
    fn format_dollars_groups_and_rounds() {
        assert_eq!(format_dollars(dec!(1234567.895)), "1,234,567.90");
    }

    #[test]
    fn format_dollars_handles_negative_amounts() {
        assert_eq!(format_dollars(dec!(-1500.25)), "-1,500.25");
        assert_eq!(format_dollars(dec!(-0.25)), "-0.25");
    }
}
