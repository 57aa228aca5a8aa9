//! Massachusetts income tax.
//!
//! MA taxes three income categories at flat rates: ordinary income
//! (wages, interest, dividends), short-term gains and long-term gains. Once
//! AGI reaches the surtax threshold the surtax rate is added to every
//! category. The standard exemption is consumed against short-term gains
//! first, then long-term gains, then ordinary income.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::bracket_tax;
use crate::calculations::capital_gains::net_state_gains;
use crate::calculations::common::{
    check_magnitude, non_negative, ratio, round_half_up, round_rate,
};
use crate::error::TaxError;
use crate::models::{
    FilingStatusCode, ScenarioInput, StateParameters, StateTaxResult, TaxBracket,
};

/// Inputs to the Massachusetts engine. Absent amounts are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxInput {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,
    /// Wages plus other income.
    pub ordinary_income: Decimal,
    /// Interest, dividends and other investment income.
    pub investment_income: Decimal,
    pub short_term_gains: Decimal,
    pub long_term_gains: Decimal,
    /// Subtracted from ordinary income (charitable contributions).
    pub deductions: Decimal,
    pub prior_capital_loss_carryforward: Decimal,
    /// Replaces the table's standard exemption when present.
    pub custom_standard_exemption: Option<Decimal>,
}

impl StateTaxInput {
    pub fn new(tax_year: i32, filing_status: FilingStatusCode) -> Self {
        Self {
            tax_year,
            filing_status,
            ordinary_income: Decimal::ZERO,
            investment_income: Decimal::ZERO,
            short_term_gains: Decimal::ZERO,
            long_term_gains: Decimal::ZERO,
            deductions: Decimal::ZERO,
            prior_capital_loss_carryforward: Decimal::ZERO,
            custom_standard_exemption: None,
        }
    }

    pub fn from_scenario(scenario: &ScenarioInput) -> Self {
        Self {
            tax_year: scenario.tax_year,
            filing_status: scenario.filing_status,
            ordinary_income: scenario.income_wages + scenario.income_other,
            investment_income: scenario.income_int
                + scenario.income_div
                + scenario.income_inv_other,
            short_term_gains: scenario.cg_short_term,
            long_term_gains: scenario.cg_long_term,
            deductions: scenario.deduct_charity,
            prior_capital_loss_carryforward: scenario.prior_carryforward.ma_capital_loss,
            custom_standard_exemption: scenario.custom_standard_deduction,
        }
    }

    fn validate(&self) -> Result<(), TaxError> {
        let amounts = [
            ("ordinary_income", self.ordinary_income),
            ("investment_income", self.investment_income),
            ("cg_short_term", self.short_term_gains),
            ("cg_long_term", self.long_term_gains),
            ("deductions", self.deductions),
            ("ma_capital_loss_carryforward", self.prior_capital_loss_carryforward),
            (
                "custom_standard_deduction",
                self.custom_standard_exemption.unwrap_or_default(),
            ),
        ];
        for (field, value) in amounts {
            check_magnitude(field, value)?;
        }

        if self.deductions < Decimal::ZERO {
            return Err(TaxError::invalid_input(
                "deductions",
                format!("must be non-negative, got {}", self.deductions),
            ));
        }
        if self.prior_capital_loss_carryforward < Decimal::ZERO {
            return Err(TaxError::invalid_input(
                "ma_capital_loss_carryforward",
                format!(
                    "carryforward must be non-negative, got {}",
                    self.prior_capital_loss_carryforward
                ),
            ));
        }
        match self.custom_standard_exemption {
            Some(custom) if custom < Decimal::ZERO => Err(TaxError::invalid_input(
                "custom_standard_deduction",
                format!("must be non-negative, got {custom}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Taxable amounts per category after the exemption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ExemptionAllocation {
    short_term: Decimal,
    long_term: Decimal,
    ordinary: Decimal,
}

/// Massachusetts engine bound to one (year, filing status) parameter set.
#[derive(Debug, Clone)]
pub struct MaStateTaxEngine<'a> {
    params: &'a StateParameters,
}

impl<'a> MaStateTaxEngine<'a> {
    pub fn new(params: &'a StateParameters) -> Self {
        Self { params }
    }

    /// Runs the full Massachusetts pipeline.
    ///
    /// # Errors
    ///
    /// [`TaxError::MalformedParameterData`] when the parameters are out of
    /// range, [`TaxError::InvalidScenarioInput`] for negative deductions,
    /// carryforward or exemption override.
    pub fn calculate(
        &self,
        input: &StateTaxInput,
    ) -> Result<StateTaxResult, TaxError> {
        self.params.validate()?;
        input.validate()?;

        let standard_exemption = input
            .custom_standard_exemption
            .unwrap_or(self.params.standard_exemption);

        let netting = net_state_gains(
            input.short_term_gains,
            input.long_term_gains,
            input.investment_income,
            input.prior_capital_loss_carryforward,
            self.params.max_investment_income_offset,
        );
        let taxable_short_term = netting.taxable_short_term();
        let taxable_long_term = netting.taxable_long_term();

        let adjusted_ordinary = non_negative(input.ordinary_income - input.deductions);
        let agi = adjusted_ordinary
            + netting.adjusted_investment_income
            + taxable_short_term
            + taxable_long_term;

        let is_surtax = self.surtax_applies(agi);
        let surtax = if is_surtax {
            self.params.surtax_rate
        } else {
            Decimal::ZERO
        };

        let allocation = if agi > standard_exemption {
            allocate_exemption(
                standard_exemption,
                taxable_short_term,
                taxable_long_term,
                adjusted_ordinary + netting.adjusted_investment_income,
            )
        } else {
            ExemptionAllocation::default()
        };

        let ordinary_rate = self.params.ordinary_rate + surtax;
        let short_term_rate = self.params.short_term_rate + surtax;
        let long_term_rate = self.params.long_term_rate + surtax;

        let ordinary_tax = bracket_tax(allocation.ordinary, &[TaxBracket::flat(ordinary_rate)]).tax;
        let short_term_tax =
            bracket_tax(allocation.short_term, &[TaxBracket::flat(short_term_rate)]).tax;
        let long_term_tax =
            bracket_tax(allocation.long_term, &[TaxBracket::flat(long_term_rate)]).tax;
        let total_tax = ordinary_tax + short_term_tax + long_term_tax;
        let taxable_income = allocation.ordinary + allocation.short_term + allocation.long_term;

        debug!(
            tax_year = input.tax_year,
            filing_status = %input.filing_status,
            agi = %agi,
            standard_exemption = %standard_exemption,
            is_surtax,
            taxable_ordinary = %allocation.ordinary,
            taxable_short_term = %allocation.short_term,
            taxable_long_term = %allocation.long_term,
            total_tax = %total_tax,
            "MA tax calculated"
        );

        Ok(StateTaxResult {
            tax_year: input.tax_year,
            filing_status: input.filing_status,
            agi: round_half_up(agi),
            standard_exemption: round_half_up(standard_exemption),
            investment_income_offset: round_half_up(netting.investment_income_offset),
            taxable_income: round_half_up(taxable_income),
            taxable_ordinary: round_half_up(allocation.ordinary),
            taxable_short_term: round_half_up(allocation.short_term),
            taxable_long_term: round_half_up(allocation.long_term),
            ordinary_tax: round_half_up(ordinary_tax),
            short_term_tax: round_half_up(short_term_tax),
            long_term_tax: round_half_up(long_term_tax),
            total_tax: round_half_up(total_tax),
            is_surtax,
            ordinary_rate: round_rate(ordinary_rate),
            short_term_rate: round_rate(short_term_rate),
            long_term_rate: round_rate(long_term_rate),
            effective_rate: round_rate(ratio("effective_rate", total_tax, taxable_income)?),
            capital_loss_carryforward: round_half_up(netting.carryforward),
        })
    }

    fn surtax_applies(
        &self,
        agi: Decimal,
    ) -> bool {
        match self.params.surtax_threshold {
            Some(threshold) if threshold > Decimal::ZERO => agi >= threshold,
            _ => false,
        }
    }
}

/// Consumes the exemption in fixed order: short-term, long-term, ordinary.
fn allocate_exemption(
    exemption: Decimal,
    short_term: Decimal,
    long_term: Decimal,
    ordinary: Decimal,
) -> ExemptionAllocation {
    let mut remaining = exemption;

    let taxable_short_term = non_negative(short_term - remaining);
    remaining = non_negative(remaining - short_term);

    let taxable_long_term = non_negative(long_term - remaining);
    remaining = non_negative(remaining - long_term);

    ExemptionAllocation {
        short_term: taxable_short_term,
        long_term: taxable_long_term,
        ordinary: non_negative(ordinary - remaining),
    }
}
