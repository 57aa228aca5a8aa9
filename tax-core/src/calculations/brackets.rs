//! Progressive bracket evaluation shared by both jurisdictions.
//!
//! Two entry points:
//!
//! - [`bracket_tax`] taxes an amount on its own, bottom bracket first.
//! - [`stacked_bracket_tax`] taxes an amount layered on top of a base that
//!   already occupies the lower brackets (federal long-term gains over
//!   ordinary income).
//!
//! Both expect a schedule that passed
//! [`validate_schedule`](crate::models::validate_schedule).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::TaxBracket;
use crate::calculations::common::{max, non_negative};

/// Tax owed on an amount and the rate applied to its top dollar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTax {
    pub tax: Decimal,
    pub marginal_rate: Decimal,
}

impl BracketTax {
    pub const ZERO: BracketTax = BracketTax {
        tax: Decimal::ZERO,
        marginal_rate: Decimal::ZERO,
    };
}

/// Progressive tax on `amount`.
///
/// Each bracket taxes the part of the amount in `[min, min(max, amount))`;
/// the walk stops at the bracket holding the top dollar, whose rate is the
/// marginal rate. Non-positive amounts owe nothing at a zero marginal rate.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::TaxBracket;
/// use tax_core::calculations::bracket_tax;
///
/// let brackets = vec![
///     TaxBracket::new(dec!(0), Some(dec!(50000)), dec!(0.10)),
///     TaxBracket::new(dec!(50000), None, dec!(0.22)),
/// ];
///
/// let result = bracket_tax(dec!(80000), &brackets);
/// assert_eq!(result.tax, dec!(11600));
/// assert_eq!(result.marginal_rate, dec!(0.22));
/// ```
pub fn bracket_tax(
    amount: Decimal,
    brackets: &[TaxBracket],
) -> BracketTax {
    if amount <= Decimal::ZERO {
        return BracketTax::ZERO;
    }

    let mut tax = Decimal::ZERO;
    let mut marginal_rate = Decimal::ZERO;

    for bracket in brackets {
        if amount <= bracket.min_income {
            break;
        }

        let top = match bracket.max_income {
            Some(max_income) if amount > max_income => max_income,
            _ => amount,
        };
        let taxable_in_bracket = top - bracket.min_income;
        tax += taxable_in_bracket * bracket.tax_rate;
        marginal_rate = bracket.tax_rate;

        trace!(
            min = %bracket.min_income,
            max = ?bracket.max_income,
            rate = %bracket.tax_rate,
            taxable_in_bracket = %taxable_in_bracket,
            running_tax = %tax,
            "ordinary bracket step"
        );

        if top == amount {
            break;
        }
    }

    BracketTax { tax, marginal_rate }
}

/// Tax on `stacked` when it sits on top of `base` income.
///
/// The running floor starts at `base`; in each bracket the stacked amount
/// fills `max(0, min(base + stacked, bracket_max) - max(bracket_min, floor))`,
/// capped by what is still untaxed, and the floor then advances to the
/// bracket's max. The marginal rate is the rate of the bracket holding the
/// last stacked dollar.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::TaxBracket;
/// use tax_core::calculations::stacked_bracket_tax;
///
/// let ltcg = vec![
///     TaxBracket::new(dec!(0), Some(dec!(94050)), dec!(0)),
///     TaxBracket::new(dec!(94050), Some(dec!(583750)), dec!(0.15)),
///     TaxBracket::new(dec!(583750), None, dec!(0.20)),
/// ];
///
/// // $90,050 of ordinary income leaves $4,000 of room in the 0% band.
/// let result = stacked_bracket_tax(dec!(90050), dec!(10000), &ltcg);
/// assert_eq!(result.tax, dec!(900));
/// ```
pub fn stacked_bracket_tax(
    base: Decimal,
    stacked: Decimal,
    brackets: &[TaxBracket],
) -> BracketTax {
    if stacked <= Decimal::ZERO {
        return BracketTax::ZERO;
    }

    let base = non_negative(base);
    let total = base + stacked;
    let mut floor = base;
    let mut remaining = stacked;
    let mut tax = Decimal::ZERO;
    let mut marginal_rate = Decimal::ZERO;

    for bracket in brackets {
        if remaining <= Decimal::ZERO {
            break;
        }

        let top = bracket.max_income.map_or(total, |max_income| max_income.min(total));
        let in_bracket = non_negative(top - max(bracket.min_income, floor)).min(remaining);
        if in_bracket > Decimal::ZERO {
            tax += in_bracket * bracket.tax_rate;
            remaining -= in_bracket;
            marginal_rate = bracket.tax_rate;
        }

        trace!(
            min = %bracket.min_income,
            max = ?bracket.max_income,
            rate = %bracket.tax_rate,
            in_bracket = %in_bracket,
            running_tax = %tax,
            "stacked bracket step"
        );

        match bracket.max_income {
            Some(max_income) => floor = max(floor, max_income),
            None => break,
        }
    }

    BracketTax { tax, marginal_rate }
}
