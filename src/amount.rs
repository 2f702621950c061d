//! Amount synchronization between the wrapped and native fields.

use crate::models::{AmountPair, Side};
use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::str::FromStr;

/// Conversion fee in basis points (0.3%).
pub const FEE_RATE_BPS: u32 = 30;

/// Fractional digits shown in a derived field (satoshi precision).
pub const DISPLAY_DECIMALS: i64 = 8;

/// Fee rate as a fraction, e.g. 0.003.
pub fn fee_rate() -> BigDecimal {
    BigDecimal::new(BigInt::from(FEE_RATE_BPS), 4)
}

/// Share of the sent amount that reaches the receiver: `1 - fee_rate`.
pub fn retention() -> BigDecimal {
    BigDecimal::from(1) - fee_rate()
}

/// How a field value reads as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAmount {
    Positive(BigDecimal),
    /// Zero, negative, or so small it underflows to zero.
    NotPositive,
    /// Not a finite number.
    NotANumber,
}

/// Classify a field value.
///
/// The text must read as a finite `f64` before it is parsed as an exact
/// decimal. This bounds the exponent to the `f64` range, so `1e400` is not a
/// number and `1e-400` is zero.
pub fn parse_amount(raw: &str) -> ParsedAmount {
    let trimmed = raw.trim();
    let approx = match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return ParsedAmount::NotANumber,
    };
    if approx <= 0.0 {
        return ParsedAmount::NotPositive;
    }
    match BigDecimal::from_str(trimmed) {
        Ok(value) if value.is_zero() || value.is_negative() => ParsedAmount::NotPositive,
        Ok(value) => ParsedAmount::Positive(value),
        Err(_) => ParsedAmount::NotANumber,
    }
}

/// Parse a field value, returning it only when it is a strictly positive number.
///
/// Surrounding whitespace is ignored. Empty input, text that is not a finite
/// number, zero and negative values all yield `None`.
pub fn parse_positive(raw: &str) -> Option<BigDecimal> {
    match parse_amount(raw) {
        ParsedAmount::Positive(value) => Some(value),
        _ => None,
    }
}

/// Amount of native BTC received for `wbtc` sent: `(1 - f) * wbtc`.
pub fn derive_from_wbtc(wbtc: &BigDecimal) -> BigDecimal {
    wbtc * retention()
}

/// Amount of WBTC matching `btc` on the native side: `btc / (1 - f)`.
pub fn derive_from_btc(btc: &BigDecimal) -> BigDecimal {
    btc / retention()
}

/// Format with exactly [`DISPLAY_DECIMALS`] fractional digits, rounding half up.
/// Never produces scientific notation.
pub fn format_fixed(value: &BigDecimal) -> String {
    let rounded = value
        .with_scale_round(DISPLAY_DECIMALS, RoundingMode::HalfUp)
        .with_scale(DISPLAY_DECIMALS);
    let (digits, _) = rounded.as_bigint_and_exponent();
    let sign = if digits.is_negative() { "-" } else { "" };

    let decimals = DISPLAY_DECIMALS as usize;
    let width = decimals + 1;
    let padded = format!("{:0>width$}", digits.abs().to_string());
    let split = padded.len() - decimals;
    format!("{sign}{}.{}", &padded[..split], &padded[split..])
}

/// Apply a user edit to one side and rebuild the whole pair.
///
/// # Arguments
/// * `side` - The field the user typed into
/// * `raw` - The field's text, stored verbatim on the edited side
///
/// # Returns
/// A fresh pair: the edited side holds `raw`, the other side holds the
/// derived amount, or `None` when `raw` is not a strictly positive number.
/// Nothing from the previous pair survives.
pub fn apply_edit(side: Side, raw: &str) -> AmountPair {
    let derived = parse_positive(raw).map(|value| {
        let counterpart = match side {
            Side::Wbtc => derive_from_wbtc(&value),
            Side::Btc => derive_from_btc(&value),
        };
        format_fixed(&counterpart)
    });

    match side {
        Side::Wbtc => AmountPair {
            wbtc: Some(raw.to_string()),
            btc: derived,
        },
        Side::Btc => AmountPair {
            wbtc: derived,
            btc: Some(raw.to_string()),
        },
    }
}
