//! Common numeric helpers shared by both jurisdictions.
//!
//! Engines compute with unrounded decimals and round only when building a
//! result record: money to cents, rates to basis points.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::TaxError;

/// Largest magnitude accepted for any input amount: one quadrillion.
///
/// Sums and rate products over amounts within this bound stay far inside
/// the `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Rounds a money amount to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 round away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate (expressed as a fraction) to basis-point precision.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_rate;
///
/// assert_eq!(round_rate(dec!(0.123456)), dec!(0.1235));
/// ```
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Clamps a value at zero from below.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Rejects an input amount whose magnitude exceeds [`MAX_AMOUNT`].
pub(crate) fn check_magnitude(
    field: &str,
    value: Decimal,
) -> Result<(), TaxError> {
    if value.abs() > MAX_AMOUNT {
        return Err(TaxError::invalid_input(
            field,
            format!("magnitude must not exceed {MAX_AMOUNT}, got {value}"),
        ));
    }
    Ok(())
}

/// `numerator / denominator`, or zero when the denominator is not positive.
///
/// Degenerate scenarios (no taxable income, no AGI) report a zero rate
/// instead of failing. A quotient outside the `Decimal` range, from a
/// vanishingly small denominator, is reported against `field`.
pub fn ratio(
    field: &str,
    numerator: Decimal,
    denominator: Decimal,
) -> Result<Decimal, TaxError> {
    if denominator <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    numerator.checked_div(denominator).ok_or_else(|| {
        TaxError::invalid_input(
            field,
            format!("{numerator} / {denominator} is out of range"),
        )
    })
}
