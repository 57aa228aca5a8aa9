//! US federal income tax.
//!
//! Pipeline:
//!
//! 1. Net capital gains, applying prior-year loss carryforwards.
//! 2. Build ordinary income and AGI.
//! 3. Choose itemized or standard deductions.
//! 4. Split taxable income into an ordinary part and a capital-gains part
//!    (qualified dividends move to the latter).
//! 5. Tax the ordinary part on the ordinary schedule and the capital-gains
//!    part on the LTCG schedule, stacked above ordinary income.
//! 6. Add the net investment income tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::{bracket_tax, stacked_bracket_tax};
use crate::calculations::capital_gains::{FEDERAL_CAPITAL_LOSS_LIMIT, net_federal_gains};
use crate::calculations::common::{
    check_magnitude, non_negative, ratio, round_half_up, round_rate,
};
use crate::calculations::deductions::{DeductionEngine, DeductionInput};
use crate::error::TaxError;
use crate::models::{FederalParameters, FederalTaxResult, FilingStatusCode, ScenarioInput};

/// Inputs to the federal engine. Absent amounts are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalTaxInput {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,

    pub wages: Decimal,
    pub interest: Decimal,
    /// Total dividends, qualified portion included.
    pub dividends: Decimal,
    pub qualified_dividends: Decimal,
    pub other_investment_income: Decimal,
    pub other_income: Decimal,
    pub short_term_gains: Decimal,
    pub long_term_gains: Decimal,

    pub medical_expenses: Decimal,
    pub property_tax: Decimal,
    /// State income tax for the same year, from the state engine.
    pub state_income_tax: Decimal,
    pub charitable_contributions: Decimal,
    pub investment_interest_expense: Decimal,
    pub mortgage_interest: Decimal,
    pub mortgage_rate: Decimal,
    pub mortgage_origination_year: i32,

    pub prior_investment_interest_carryforward: Decimal,
    pub prior_short_term_loss_carryforward: Decimal,
    pub prior_long_term_loss_carryforward: Decimal,
}

impl FederalTaxInput {
    pub fn new(tax_year: i32, filing_status: FilingStatusCode) -> Self {
        Self {
            tax_year,
            filing_status,
            wages: Decimal::ZERO,
            interest: Decimal::ZERO,
            dividends: Decimal::ZERO,
            qualified_dividends: Decimal::ZERO,
            other_investment_income: Decimal::ZERO,
            other_income: Decimal::ZERO,
            short_term_gains: Decimal::ZERO,
            long_term_gains: Decimal::ZERO,
            medical_expenses: Decimal::ZERO,
            property_tax: Decimal::ZERO,
            state_income_tax: Decimal::ZERO,
            charitable_contributions: Decimal::ZERO,
            investment_interest_expense: Decimal::ZERO,
            mortgage_interest: Decimal::ZERO,
            mortgage_rate: Decimal::ZERO,
            mortgage_origination_year: 0,
            prior_investment_interest_carryforward: Decimal::ZERO,
            prior_short_term_loss_carryforward: Decimal::ZERO,
            prior_long_term_loss_carryforward: Decimal::ZERO,
        }
    }

    /// Builds the federal input from a scenario plus the state tax paid.
    pub fn from_scenario(
        scenario: &ScenarioInput,
        state_income_tax: Decimal,
    ) -> Self {
        let prior = &scenario.prior_carryforward;
        Self {
            tax_year: scenario.tax_year,
            filing_status: scenario.filing_status,
            wages: scenario.income_wages,
            interest: scenario.income_int,
            dividends: scenario.income_div,
            qualified_dividends: scenario.income_div_qualified,
            other_investment_income: scenario.income_inv_other,
            other_income: scenario.income_other,
            short_term_gains: scenario.cg_short_term,
            long_term_gains: scenario.cg_long_term,
            medical_expenses: scenario.deduct_medical,
            property_tax: scenario.deduct_property_tax,
            state_income_tax,
            charitable_contributions: scenario.deduct_charity,
            investment_interest_expense: scenario.deduct_margin_int,
            mortgage_interest: scenario.deduct_mortgage_int,
            mortgage_rate: scenario.deduct_mortgage_rate,
            mortgage_origination_year: scenario.deduct_mortgage_orig_year,
            prior_investment_interest_carryforward: prior.us_investment_interest,
            prior_short_term_loss_carryforward: prior.us_short_term_loss,
            prior_long_term_loss_carryforward: prior.us_long_term_loss,
        }
    }

    fn validate(&self) -> Result<(), TaxError> {
        let signed_fields = [
            ("income_wages", self.wages),
            ("income_int", self.interest),
            ("income_div", self.dividends),
            ("income_inv_other", self.other_investment_income),
            ("income_other", self.other_income),
            ("cg_short_term", self.short_term_gains),
            ("cg_long_term", self.long_term_gains),
        ];
        for (field, value) in signed_fields {
            check_magnitude(field, value)?;
        }

        let non_negative_fields = [
            ("income_div_qualified", self.qualified_dividends),
            ("deduct_medical", self.medical_expenses),
            ("deduct_property_tax", self.property_tax),
            ("deduct_state_income_tax", self.state_income_tax),
            ("deduct_charity", self.charitable_contributions),
            ("deduct_margin_int", self.investment_interest_expense),
            ("deduct_mortgage_int", self.mortgage_interest),
            ("deduct_mortgage_rate", self.mortgage_rate),
            ("us_inv_int_carryforward", self.prior_investment_interest_carryforward),
            ("us_short_term_loss_carryforward", self.prior_short_term_loss_carryforward),
            ("us_long_term_loss_carryforward", self.prior_long_term_loss_carryforward),
        ];
        for (field, value) in non_negative_fields {
            check_magnitude(field, value)?;
            if value < Decimal::ZERO {
                return Err(TaxError::invalid_input(
                    field,
                    format!("must be non-negative, got {value}"),
                ));
            }
        }

        if self.qualified_dividends > non_negative(self.dividends) {
            return Err(TaxError::invalid_input(
                "income_div_qualified",
                format!(
                    "qualified dividends {} exceed total dividends {}",
                    self.qualified_dividends, self.dividends
                ),
            ));
        }
        Ok(())
    }

    /// Interest, non-qualified dividends and other investment income; the
    /// base for the investment interest limit.
    fn net_investment_income(&self) -> Decimal {
        self.interest + self.dividends - self.qualified_dividends + self.other_investment_income
    }
}

/// Federal engine bound to one (year, filing status) parameter set.
#[derive(Debug, Clone)]
pub struct UsFederalTaxEngine<'a> {
    params: &'a FederalParameters,
}

impl<'a> UsFederalTaxEngine<'a> {
    pub fn new(params: &'a FederalParameters) -> Self {
        Self { params }
    }

    /// Runs the full federal pipeline.
    ///
    /// # Errors
    ///
    /// [`TaxError::MalformedParameterData`] when a schedule breaks the table
    /// invariants, [`TaxError::InvalidScenarioInput`] for out-of-domain
    /// inputs.
    pub fn calculate(
        &self,
        input: &FederalTaxInput,
    ) -> Result<FederalTaxResult, TaxError> {
        self.params.validate()?;
        input.validate()?;

        let netting = net_federal_gains(
            input.short_term_gains,
            input.long_term_gains,
            input.prior_short_term_loss_carryforward,
            input.prior_long_term_loss_carryforward,
            FEDERAL_CAPITAL_LOSS_LIMIT,
        );

        let ordinary_income = input.wages
            + input.interest
            + input.dividends
            + input.other_investment_income
            + input.other_income
            + netting.positive_short_term();

        let agi = if netting.net_ltcg < Decimal::ZERO {
            ordinary_income - netting.capital_loss_deduction
        } else {
            ordinary_income + netting.net_ltcg
        };

        let deductions = DeductionEngine::new(self.params).calculate(&DeductionInput {
            filing_status: input.filing_status,
            agi,
            property_tax: input.property_tax,
            state_income_tax: input.state_income_tax,
            mortgage_interest: input.mortgage_interest,
            mortgage_rate: input.mortgage_rate,
            mortgage_origination_year: input.mortgage_origination_year,
            investment_interest_expense: input.investment_interest_expense,
            net_investment_income: input.net_investment_income(),
            short_term_gain: netting.short_term,
            prior_investment_interest_carryforward: input.prior_investment_interest_carryforward,
            medical_expenses: input.medical_expenses,
            charitable_contributions: input.charitable_contributions,
        });

        let taxable_ordinary_income =
            non_negative(ordinary_income - deductions.total - input.qualified_dividends);
        let taxable_ltcg_income = non_negative(netting.net_ltcg) + input.qualified_dividends;
        let taxable_income = taxable_ordinary_income + taxable_ltcg_income;

        let ordinary = bracket_tax(taxable_ordinary_income, &self.params.ordinary_brackets);
        let ltcg = stacked_bracket_tax(
            taxable_ordinary_income,
            taxable_ltcg_income,
            &self.params.ltcg_brackets,
        );

        let niit_income = non_negative(
            input.interest
                + input.dividends
                + input.other_investment_income
                + netting.short_term
                + netting.long_term,
        );
        let niit_tax = self.niit(niit_income, agi);

        let total_tax = ordinary.tax + ltcg.tax + niit_tax;

        debug!(
            tax_year = input.tax_year,
            filing_status = %input.filing_status,
            ordinary_income = %ordinary_income,
            net_ltcg = %netting.net_ltcg,
            agi = %agi,
            total_deductions = %deductions.total,
            taxable_ordinary_income = %taxable_ordinary_income,
            taxable_ltcg_income = %taxable_ltcg_income,
            ordinary_tax = %ordinary.tax,
            ltcg_tax = %ltcg.tax,
            niit_tax = %niit_tax,
            total_tax = %total_tax,
            "US tax calculated"
        );

        Ok(FederalTaxResult {
            tax_year: input.tax_year,
            filing_status: input.filing_status,
            gross_ordinary_income: round_half_up(ordinary_income),
            gross_ltcg: round_half_up(netting.net_ltcg),
            capital_loss_deduction: round_half_up(netting.capital_loss_deduction),
            agi: round_half_up(agi),
            salt_deduction: round_half_up(deductions.salt),
            mortgage_interest_deduction: round_half_up(deductions.mortgage_interest),
            investment_interest_deduction: round_half_up(deductions.investment_interest.deduction),
            medical_deduction: round_half_up(deductions.medical),
            charitable_deduction: round_half_up(deductions.charity),
            itemized_deductions: round_half_up(deductions.itemized_total),
            standard_deduction: round_half_up(deductions.standard_deduction),
            total_deductions: round_half_up(deductions.total),
            deduction_used: deductions.deduction_used,
            taxable_income: round_half_up(taxable_income),
            taxable_ordinary_income: round_half_up(taxable_ordinary_income),
            taxable_ltcg_income: round_half_up(taxable_ltcg_income),
            ordinary_tax: round_half_up(ordinary.tax),
            ltcg_tax: round_half_up(ltcg.tax),
            niit_tax: round_half_up(niit_tax),
            total_tax: round_half_up(total_tax),
            effective_tax_rate: round_rate(ratio("effective_tax_rate", total_tax, taxable_income)?),
            effective_tax_rate_agi: round_rate(ratio("effective_tax_rate_agi", total_tax, agi)?),
            marginal_tax_rate: round_rate(ordinary.marginal_rate),
            ltcg_tax_rate: round_rate(ratio("ltcg_tax_rate", ltcg.tax, taxable_ltcg_income)?),
            investment_interest_carryforward: round_half_up(
                deductions.investment_interest.carryforward,
            ),
            short_term_loss_carryforward: round_half_up(netting.short_term_carryforward),
            long_term_loss_carryforward: round_half_up(netting.long_term_carryforward),
        })
    }

    /// Net investment income tax: the rate applied to the lesser of net
    /// investment income and AGI above the threshold.
    fn niit(
        &self,
        net_investment_income: Decimal,
        agi: Decimal,
    ) -> Decimal {
        if agi <= self.params.niit_threshold {
            return Decimal::ZERO;
        }
        let excess_agi = agi - self.params.niit_threshold;
        let taxable = net_investment_income.min(excess_agi);

        debug!(
            net_investment_income = %net_investment_income,
            excess_agi = %excess_agi,
            taxable = %taxable,
            "NIIT applies"
        );

        taxable * self.params.niit_rate
    }
}
