use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;

/// One band of a progressive schedule. `max_income` of `None` marks the
/// open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(min_income: Decimal, max_income: Option<Decimal>, tax_rate: Decimal) -> Self {
        Self {
            min_income,
            max_income,
            tax_rate,
        }
    }

    /// A single open bracket starting at zero.
    pub fn flat(tax_rate: Decimal) -> Self {
        Self::new(Decimal::ZERO, None, tax_rate)
    }

    pub fn is_open(&self) -> bool {
        self.max_income.is_none()
    }
}

/// Checks the schedule invariants every engine relies on: starts at zero,
/// contiguous, ascending, rates non-decreasing, and exactly one open bracket
/// which must be the last.
///
/// `schedule` names the schedule in the error message.
pub fn validate_schedule(schedule: &str, brackets: &[TaxBracket]) -> Result<(), TaxError> {
    let malformed = |reason: String| TaxError::MalformedParameterData {
        schedule: schedule.to_string(),
        reason,
    };

    let Some(first) = brackets.first() else {
        return Err(malformed("schedule has no brackets".to_string()));
    };
    if first.min_income != Decimal::ZERO {
        return Err(malformed(format!(
            "first bracket starts at {} instead of 0",
            first.min_income
        )));
    }

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
            return Err(malformed(format!(
                "bracket {index} has rate {} outside [0, 1]",
                bracket.tax_rate
            )));
        }

        let is_last = index + 1 == brackets.len();
        match (bracket.max_income, is_last) {
            (None, false) => {
                return Err(malformed(format!(
                    "bracket {index} is open-ended but is not the last bracket"
                )));
            }
            (Some(_), true) => {
                return Err(malformed("last bracket must be open-ended".to_string()));
            }
            (Some(max), false) => {
                if max <= bracket.min_income {
                    return Err(malformed(format!(
                        "bracket {index} max {max} is not above its min {}",
                        bracket.min_income
                    )));
                }
                let next = &brackets[index + 1];
                if next.min_income != max {
                    return Err(malformed(format!(
                        "bracket {} starts at {} but bracket {index} ends at {max}",
                        index + 1,
                        next.min_income
                    )));
                }
                if next.tax_rate < bracket.tax_rate {
                    return Err(malformed(format!(
                        "bracket {} rate {} is below bracket {index} rate {}",
                        index + 1,
                        next.tax_rate,
                        bracket.tax_rate
                    )));
                }
            }
            (None, true) => {}
        }
    }

    Ok(())
}
