//! Display formatting for order book and trade values.
//!
//! Prices render with a fixed two decimal places, as the dashboard tables show
//! them. Quantities drop trailing zeros. Both get thousands separators.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a price with exactly two decimal places (`10.5` → `"10.50"`).
pub fn price(value: &Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    group_thousands(&format!("{:.2}", rounded))
}

/// Format a quantity, trimming trailing zeros (`3.000` → `"3"`).
pub fn quantity(value: &Decimal) -> String {
    group_thousands(&value.normalize().to_string())
}

/// Adds thousands separators to the integer part of a plain decimal string.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
