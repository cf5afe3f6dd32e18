//! Decimal conversion of an amount through a unit price, for display.

use rust_decimal::prelude::*;
use tracing::debug;

/// Upper bound on fractional digits shown for a converted amount.
pub const MAX_DISPLAY_DIGITS: u32 = 6;

const ZERO: &str = "0";

/// Converts `amount` into units of an asset priced at `unit_price`.
///
/// Both operands are scaled to the asset's `decimals` before dividing, and the
/// result shows at most `min(decimals, 6)` fractional digits. Disabled or
/// incomplete inputs, and any arithmetic failure, render as `"0"`.
pub fn convert(amount: &str, unit_price: Option<Decimal>, decimals: u32, enabled: bool) -> String {
    let Some(unit_price) = unit_price else {
        return ZERO.to_string();
    };
    if !enabled || amount.trim().is_empty() || unit_price.is_zero() {
        return ZERO.to_string();
    }

    match divide(amount, unit_price, decimals) {
        Some(converted) => converted,
        None => {
            debug!(amount, %unit_price, decimals, "Conversion failed, showing zero");
            ZERO.to_string()
        }
    }
}

fn divide(amount: &str, unit_price: Decimal, decimals: u32) -> Option<String> {
    let scale = decimals.min(Decimal::MAX_SCALE);
    let amount = parse(amount)?.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    let unit_price = unit_price.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);

    let quotient = amount
        .checked_div(unit_price)?
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        .round_dp_with_strategy(scale.min(MAX_DISPLAY_DIGITS), RoundingStrategy::MidpointAwayFromZero);

    if quotient.is_zero() {
        return Some(ZERO.to_string());
    }
    Some(group_thousands(&quotient.normalize().to_string()))
}

fn parse(amount: &str) -> Option<Decimal> {
    let amount = amount.trim();
    Decimal::from_str(amount)
        .or_else(|_| Decimal::from_scientific(amount))
        .ok()
}

/// Inserts `,` separators into the integer part of a plain decimal string.
fn group_thousands(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
