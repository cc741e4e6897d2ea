//! Decimal amounts and their fixed presentation.
//!
//! Arithmetic is exact (`rust_decimal`); rounding happens only when a value is
//! formatted for output. Amounts round half away from zero to two places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary or quantity value. Never binary floating point.
pub type Amount = Decimal;

/// Number of fractional digits printed for monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Format a monetary amount with exactly two fractional digits.
///
/// `2.345` becomes `"2.35"`, `-2.345` becomes `"-2.35"`, `100` becomes `"100.00"`.
pub fn format_amount(value: Amount) -> String {
    let mut rounded =
        value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AMOUNT_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Format a quantity or unit rate without trailing zeros (`"2"`, `"0.5"`).
pub fn format_quantity(value: Amount) -> String {
    let mut normalized = value.normalize();
    if normalized.is_zero() {
        normalized.set_sign_positive(true);
    }
    normalized.to_string()
}
