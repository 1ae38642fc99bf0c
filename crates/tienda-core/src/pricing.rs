//! Money normalization and retail pricing.
//!
//! Every monetary value in this workspace is an `i64` denominated in minor
//! currency units (cents). Supplier APIs return prices as floats, decimal
//! strings, locale-formatted strings with currency symbols, or nothing at
//! all; [`normalize_price`] folds all of those into cents and maps anything
//! unparsable to `0` so malformed upstream data never reaches persistence.

use serde_json::Value;

/// Default markup applied to the landed cost when none is configured.
pub const DEFAULT_MARGIN_MULTIPLIER: f64 = 1.5;

/// Converts a heterogeneous supplier price field into cents.
///
/// Accepts JSON numbers and strings; `null`, arrays, objects, and garbage
/// normalize to `0`. Never panics.
#[must_use]
pub fn normalize_price(raw: &Value) -> i64 {
    match raw {
        Value::Number(n) => n.as_f64().map_or(0, to_cents),
        Value::String(s) => normalize_price_str(s),
        _ => 0,
    }
}

/// Converts a price string into cents.
///
/// Strips every character that is not an ASCII digit or a decimal point
/// (currency symbols, thousands separators, whitespace), parses the rest as
/// a decimal, multiplies by 100, and rounds to the nearest integer.
/// Unparsable input yields `0`.
#[must_use]
pub fn normalize_price_str(raw: &str) -> i64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().map_or(0, to_cents)
}

#[allow(clippy::cast_possible_truncation)]
fn to_cents(value: f64) -> i64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value * 100.0).round() as i64
}

/// Shipping-inclusive cost before margin: product + shipping + incidentals.
///
/// `other_cents` is reserved for payment-processing-fee buffers and is
/// usually `0`. Saturates instead of wrapping on absurd inputs.
#[must_use]
pub fn landed_cost(cost_cents: i64, shipping_cents: i64, other_cents: i64) -> i64 {
    cost_cents
        .saturating_add(shipping_cents)
        .saturating_add(other_cents)
}

/// Retail price: landed cost times the margin multiplier, rounded to the
/// nearest cent.
///
/// The multiplier applies to the *landed* cost, not the bare product cost,
/// so shipping is never sold at a loss. With `margin >= 1.0` the result is
/// always `>=` the landed cost.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn sell_price(landed_cents: i64, margin: f64) -> i64 {
    if !margin.is_finite() || margin <= 0.0 || landed_cents <= 0 {
        return landed_cents.max(0);
    }
    (landed_cents as f64 * margin).round() as i64
}

/// Configured pricing constants, read once from [`crate::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    /// Markup applied to the landed cost (e.g. `1.5` for a 50% margin).
    pub margin_multiplier: f64,
    /// Fixed per-product cost buffer in cents (payment fees etc.).
    pub other_costs_cents: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            margin_multiplier: DEFAULT_MARGIN_MULTIPLIER,
            other_costs_cents: 0,
        }
    }
}

impl PricingPolicy {
    /// Computes the retail price for a product cost and shipping estimate.
    #[must_use]
    pub fn sell_for(&self, cost_cents: i64, shipping_cents: i64) -> i64 {
        let landed = landed_cost(cost_cents, shipping_cents, self.other_costs_cents);
        sell_price(landed, self.margin_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_decimal_string() {
        assert_eq!(normalize_price_str("19.99"), 1999);
    }

    #[test]
    fn string_with_currency_symbol_and_separators() {
        assert_eq!(normalize_price_str("$1,234.56"), 123_456);
        assert_eq!(normalize_price_str("US $7.62"), 762);
    }

    #[test]
    fn integer_string() {
        assert_eq!(normalize_price_str("30"), 3000);
    }

    #[test]
    fn garbage_normalizes_to_zero() {
        for garbage in ["", "free!", "N/A", "precio", "..", "1.2.3"] {
            assert_eq!(normalize_price_str(garbage), 0, "input: {garbage:?}");
        }
    }

    #[test]
    fn json_number_and_string_agree() {
        assert_eq!(normalize_price(&json!(12.5)), 1250);
        assert_eq!(normalize_price(&json!("12.5")), 1250);
    }

    #[test]
    fn json_null_and_structures_are_zero() {
        assert_eq!(normalize_price(&Value::Null), 0);
        assert_eq!(normalize_price(&json!([1, 2])), 0);
        assert_eq!(normalize_price(&json!({"amount": 5})), 0);
    }

    #[test]
    fn negative_prices_clamp_to_zero() {
        assert_eq!(normalize_price(&json!(-3.0)), 0);
    }

    #[test]
    fn rounding_is_to_nearest_cent() {
        assert_eq!(normalize_price_str("0.005"), 1);
        assert_eq!(normalize_price_str("0.004"), 0);
    }

    #[test]
    fn matches_round_of_parsed_float_times_100() {
        for raw in ["0.01", "1.00", "19.99", "249.95", "1005.49"] {
            let expected = (raw.parse::<f64>().unwrap() * 100.0).round() as i64;
            assert_eq!(normalize_price_str(raw), expected, "input: {raw}");
        }
    }

    #[test]
    fn landed_cost_sums_components() {
        assert_eq!(landed_cost(1000, 350, 0), 1350);
        assert_eq!(landed_cost(1000, 350, 45), 1395);
    }

    #[test]
    fn landed_cost_saturates() {
        assert_eq!(landed_cost(i64::MAX, 1, 1), i64::MAX);
    }

    #[test]
    fn sell_price_never_below_landed_when_margin_at_least_one() {
        for (cost, shipping, other) in [(0, 0, 0), (1, 0, 0), (999, 350, 45), (123_456, 0, 99)] {
            for margin in [1.0, 1.25, 1.5, 2.0] {
                let landed = landed_cost(cost, shipping, other);
                assert!(
                    sell_price(landed, margin) >= landed,
                    "cost={cost} shipping={shipping} other={other} margin={margin}"
                );
            }
        }
    }

    #[test]
    fn sell_price_applies_margin_to_landed_cost() {
        // 10.00 product + 3.50 shipping at 1.5x sells for 20.25, not 18.50.
        assert_eq!(sell_price(landed_cost(1000, 350, 0), 1.5), 2025);
    }

    #[test]
    fn degenerate_margin_passes_landed_through() {
        assert_eq!(sell_price(1350, 0.0), 1350);
        assert_eq!(sell_price(1350, f64::NAN), 1350);
    }

    #[test]
    fn policy_default_is_fifty_percent_margin() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.sell_for(1000, 0), 1500);
    }
}
