//! Federal itemized deductions (Schedule A) and the itemized vs standard
//! choice.
//!
//! | Component | Rule |
//! |-----------|------|
//! | SALT | `min(property tax + state income tax, cap)` |
//! | Mortgage interest | prorated when the implied balance exceeds the acquisition-debt limit |
//! | Investment interest | limited to net investment income; excess carries forward |
//! | Medical | only the part above 7.5% of AGI |
//! | Charity | taken as reported |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::non_negative;
use crate::models::{DeductionType, FederalParameters, FilingStatusCode};

/// Share of AGI that medical expenses must exceed.
pub const MEDICAL_AGI_FLOOR: Decimal = Decimal::from_parts(75, 0, 0, false, 3);

/// First origination year fully under the reduced acquisition-debt limit.
const POST_LIMIT_ORIGINATION_YEAR: i32 = 2018;

const POST_LIMIT: Decimal = Decimal::from_parts(750_000, 0, 0, false, 0);
const POST_LIMIT_MFS: Decimal = Decimal::from_parts(375_000, 0, 0, false, 0);
const PRE_LIMIT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const PRE_LIMIT_MFS: Decimal = Decimal::from_parts(500_000, 0, 0, false, 0);

/// Inputs to the deduction calculation. Absent amounts are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionInput {
    /// Married filing separately halves the acquisition-debt limit.
    pub filing_status: FilingStatusCode,
    pub agi: Decimal,

    pub property_tax: Decimal,
    pub state_income_tax: Decimal,

    pub mortgage_interest: Decimal,
    pub mortgage_rate: Decimal,
    pub mortgage_origination_year: i32,

    pub investment_interest_expense: Decimal,
    /// Interest, non-qualified dividends and other investment income.
    pub net_investment_income: Decimal,
    /// Short-term balance after netting; only a gain counts as investment income.
    pub short_term_gain: Decimal,
    pub prior_investment_interest_carryforward: Decimal,

    pub medical_expenses: Decimal,
    pub charitable_contributions: Decimal,
}

impl DeductionInput {
    pub fn new(filing_status: FilingStatusCode, agi: Decimal) -> Self {
        Self {
            filing_status,
            agi,
            property_tax: Decimal::ZERO,
            state_income_tax: Decimal::ZERO,
            mortgage_interest: Decimal::ZERO,
            mortgage_rate: Decimal::ZERO,
            mortgage_origination_year: 0,
            investment_interest_expense: Decimal::ZERO,
            net_investment_income: Decimal::ZERO,
            short_term_gain: Decimal::ZERO,
            prior_investment_interest_carryforward: Decimal::ZERO,
            medical_expenses: Decimal::ZERO,
            charitable_contributions: Decimal::ZERO,
        }
    }
}

/// Allowed investment interest and the amount carried to next year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentInterest {
    pub deduction: Decimal,
    pub carryforward: Decimal,
}

/// Every itemized component plus the chosen total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionResult {
    pub salt: Decimal,
    pub mortgage_interest: Decimal,
    pub investment_interest: InvestmentInterest,
    pub medical: Decimal,
    pub charity: Decimal,
    pub itemized_total: Decimal,
    pub standard_deduction: Decimal,
    /// `max(itemized_total, standard_deduction)`.
    pub total: Decimal,
    pub deduction_used: DeductionType,
}

/// Calculator for federal deductions under one year's parameters.
#[derive(Debug, Clone)]
pub struct DeductionEngine<'a> {
    params: &'a FederalParameters,
}

impl<'a> DeductionEngine<'a> {
    pub fn new(params: &'a FederalParameters) -> Self {
        Self { params }
    }

    /// Computes every component and picks itemized or standard, whichever is
    /// larger. A tie goes to the standard deduction.
    pub fn calculate(
        &self,
        input: &DeductionInput,
    ) -> DeductionResult {
        let salt = self.salt(input.property_tax, input.state_income_tax);
        let mortgage_interest = mortgage_interest_deduction(
            input.mortgage_interest,
            input.mortgage_rate,
            input.mortgage_origination_year,
            input.filing_status,
        );
        let investment_interest = investment_interest_deduction(
            input.investment_interest_expense,
            input.net_investment_income,
            input.short_term_gain,
            input.prior_investment_interest_carryforward,
        );
        let medical = medical_expense_deduction(input.medical_expenses, input.agi);
        let charity = non_negative(input.charitable_contributions);

        let itemized_total =
            salt + mortgage_interest + investment_interest.deduction + medical + charity;
        let standard_deduction = self.params.standard_deduction;
        let (total, deduction_used) = if itemized_total > standard_deduction {
            (itemized_total, DeductionType::Itemized)
        } else {
            (standard_deduction, DeductionType::Standard)
        };

        debug!(
            salt = %salt,
            mortgage_interest = %mortgage_interest,
            investment_interest = %investment_interest.deduction,
            investment_interest_carryforward = %investment_interest.carryforward,
            medical = %medical,
            charity = %charity,
            itemized_total = %itemized_total,
            standard_deduction = %standard_deduction,
            deduction_used = %deduction_used,
            "US deductions selected"
        );

        DeductionResult {
            salt,
            mortgage_interest,
            investment_interest,
            medical,
            charity,
            itemized_total,
            standard_deduction,
            total,
            deduction_used,
        }
    }

    /// State and local taxes, capped.
    pub fn salt(
        &self,
        property_tax: Decimal,
        state_income_tax: Decimal,
    ) -> Decimal {
        non_negative(property_tax + state_income_tax).min(self.params.salt_cap)
    }
}

/// Acquisition-debt limit for a mortgage.
///
/// Loans from 2018 on, or from 2017 with a known balance, fall under the
/// reduced limit; older loans keep the grandfathered one. Married filing
/// separately halves either limit.
pub fn acquisition_debt_limit(
    origination_year: i32,
    implied_balance: Decimal,
    filing_status: FilingStatusCode,
) -> Decimal {
    let post_limit = origination_year >= POST_LIMIT_ORIGINATION_YEAR
        || (origination_year == POST_LIMIT_ORIGINATION_YEAR - 1
            && implied_balance > Decimal::ZERO);

    match (post_limit, filing_status.is_married_filing_separately()) {
        (true, false) => POST_LIMIT,
        (true, true) => POST_LIMIT_MFS,
        (false, false) => PRE_LIMIT,
        (false, true) => PRE_LIMIT_MFS,
    }
}

/// Deductible mortgage interest.
///
/// The balance is reconstructed as `interest / rate` (zero without a rate).
/// Interest on a balance above the acquisition-debt limit is prorated by
/// `limit / balance`, which reduces to `limit * rate`. A rate small enough
/// to push the balance past the `Decimal` range is always over the limit.
pub fn mortgage_interest_deduction(
    interest: Decimal,
    rate: Decimal,
    origination_year: i32,
    filing_status: FilingStatusCode,
) -> Decimal {
    if interest <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let balance = if rate > Decimal::ZERO {
        interest.checked_div(rate)
    } else {
        Some(Decimal::ZERO)
    };
    let limit = acquisition_debt_limit(
        origination_year,
        balance.unwrap_or(Decimal::MAX),
        filing_status,
    );

    let deduction = match balance {
        Some(balance) if balance <= limit => interest,
        _ => limit * rate,
    };

    debug!(
        balance = ?balance,
        limit = %limit,
        deduction = %deduction,
        "mortgage interest limited"
    );

    deduction
}

/// Investment interest expense limited to net investment income.
///
/// The cap is net investment income plus any short-term gain; current
/// expense and the prior carryforward together are allowed up to the cap
/// and the rest carries forward.
pub fn investment_interest_deduction(
    expense: Decimal,
    net_investment_income: Decimal,
    short_term_gain: Decimal,
    prior_carryforward: Decimal,
) -> InvestmentInterest {
    let expense = non_negative(expense);
    let prior_carryforward = non_negative(prior_carryforward);
    if expense <= Decimal::ZERO && prior_carryforward <= Decimal::ZERO {
        return InvestmentInterest::default();
    }

    let cap = non_negative(net_investment_income + non_negative(short_term_gain));
    let total = expense + prior_carryforward;

    if cap >= total {
        InvestmentInterest {
            deduction: total,
            carryforward: Decimal::ZERO,
        }
    } else {
        InvestmentInterest {
            deduction: cap,
            carryforward: total - cap,
        }
    }
}

/// Medical expenses above 7.5% of AGI. A negative AGI sets no floor.
pub fn medical_expense_deduction(
    expenses: Decimal,
    agi: Decimal,
) -> Decimal {
    if expenses <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    non_negative(expenses - non_negative(agi) * MEDICAL_AGI_FLOOR)
}
