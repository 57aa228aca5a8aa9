//! One household, one tax year, both jurisdictions.
//!
//! The state engine runs first because state income tax feeds the federal
//! SALT deduction. The summary carries both results plus the carryforward
//! record for the following year.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{ratio, round_half_up, round_rate};
use crate::calculations::federal::{FederalTaxInput, UsFederalTaxEngine};
use crate::calculations::state::{MaStateTaxEngine, StateTaxInput};
use crate::error::TaxError;
use crate::models::{
    CarryforwardState, FederalTaxResult, ParameterTables, ScenarioInput, StateTaxResult,
};

/// Both jurisdictions' results for a single scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearSummary {
    pub state: StateTaxResult,
    pub federal: FederalTaxResult,
    /// Carryforward record for `tax_year + 1`.
    pub next_carryforward: CarryforwardState,
    /// Federal gross ordinary income plus net long-term gain.
    pub gross_income: Decimal,
    pub total_tax: Decimal,
    /// Combined tax over gross income.
    pub total_tax_rate: Decimal,
    pub net_income: Decimal,
}

/// Computes MA and US tax for `scenario` and the next year's carryforward.
///
/// # Errors
///
/// Fails without a partial result when the year or filing status is not in
/// `tables`, or when the scenario is out of domain.
pub fn calculate_tax_year(
    tables: &ParameterTables,
    scenario: &ScenarioInput,
) -> Result<TaxYearSummary, TaxError> {
    scenario.validate()?;

    let state_params = tables.state(scenario.tax_year, scenario.filing_status)?;
    let federal_params = tables.federal(scenario.tax_year, scenario.filing_status)?;

    let state =
        MaStateTaxEngine::new(state_params).calculate(&StateTaxInput::from_scenario(scenario))?;
    let federal = UsFederalTaxEngine::new(federal_params)
        .calculate(&FederalTaxInput::from_scenario(scenario, state.total_tax))?;

    let next_carryforward = CarryforwardState {
        ma_capital_loss: state.capital_loss_carryforward,
        us_investment_interest: federal.investment_interest_carryforward,
        us_short_term_loss: federal.short_term_loss_carryforward,
        us_long_term_loss: federal.long_term_loss_carryforward,
    };

    let gross_income = federal.gross_ordinary_income + federal.gross_ltcg;
    let total_tax = state.total_tax + federal.total_tax;
    let net_income = gross_income - total_tax;

    debug!(
        tax_year = scenario.tax_year,
        gross_income = %gross_income,
        state_tax = %state.total_tax,
        federal_tax = %federal.total_tax,
        net_income = %net_income,
        "tax year calculated"
    );

    Ok(TaxYearSummary {
        state,
        federal,
        next_carryforward,
        gross_income: round_half_up(gross_income),
        total_tax: round_half_up(total_tax),
        total_tax_rate: round_rate(ratio("total_tax_rate", total_tax, gross_income)?),
        net_income: round_half_up(net_income),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{
        FederalParameters, FilingStatusCode, StateParameters, TaxBracket, TaxYearParameters,
    };

    fn tables() -> ParameterTables {
        let mut year = TaxYearParameters::new(2025);
        year.federal.insert(
            FilingStatusCode::MarriedFilingJointly,
            FederalParameters {
                ordinary_brackets: vec![
                    TaxBracket::new(dec!(0), Some(dec!(50000)), dec!(0.10)),
                    TaxBracket::new(dec!(50000), None, dec!(0.22)),
                ],
                ltcg_brackets: vec![
                    TaxBracket::new(dec!(0), Some(dec!(60000)), dec!(0)),
                    TaxBracket::new(dec!(60000), None, dec!(0.15)),
                ],
                standard_deduction: dec!(30000),
                salt_cap: dec!(10000),
                niit_threshold: dec!(250000),
                niit_rate: dec!(0.038),
            },
        );
        year.state.insert(
            FilingStatusCode::MarriedFilingJointly,
            StateParameters {
                ordinary_rate: dec!(0.05),
                short_term_rate: dec!(0.085),
                long_term_rate: dec!(0.05),
                standard_exemption: dec!(8800),
                surtax_threshold: Some(dec!(1000000)),
                surtax_rate: dec!(0.04),
                max_investment_income_offset: dec!(2000),
            },
        );

        let mut tables = ParameterTables::new();
        tables.insert(year).unwrap();
        tables
    }

    fn scenario() -> ScenarioInput {
        let mut scenario = ScenarioInput::new(2025, FilingStatusCode::MarriedFilingJointly);
        scenario.income_wages = dec!(100000);
        scenario
    }

    // =========================================================================
    // calculate_tax_year tests
    // =========================================================================

    #[test]
    fn combines_state_and_federal() {
        let summary = calculate_tax_year(&tables(), &scenario()).unwrap();

        // MA: (100,000 - 8,800) * 5%
        assert_eq!(summary.state.total_tax, dec!(4560));
        // US: 5,000 + 20,000 * 22%
        assert_eq!(summary.federal.total_tax, dec!(9400));
        assert_eq!(summary.gross_income, dec!(100000));
        assert_eq!(summary.total_tax, dec!(13960));
        assert_eq!(summary.net_income, dec!(86040));
        assert_eq!(summary.total_tax_rate, dec!(0.1396));
        assert!(summary.next_carryforward.is_zero());
    }

    #[test]
    fn state_tax_feeds_federal_salt() {
        let mut scenario = scenario();
        scenario.deduct_property_tax = dec!(3000);

        let summary = calculate_tax_year(&tables(), &scenario).unwrap();

        assert_eq!(summary.federal.salt_deduction, dec!(7560));
    }

    #[test]
    fn losses_flow_into_next_carryforward() {
        let mut scenario = scenario();
        scenario.cg_long_term = dec!(-10000);
        scenario.cg_short_term = dec!(4000);

        let summary = calculate_tax_year(&tables(), &scenario).unwrap();

        assert_eq!(summary.federal.long_term_loss_carryforward, dec!(3000));
        assert_eq!(summary.next_carryforward.us_long_term_loss, dec!(3000));
        assert_eq!(summary.next_carryforward.us_short_term_loss, dec!(0));
        // MA: 6,000 net loss, 2,000 offset against investment income.
        assert_eq!(summary.next_carryforward.ma_capital_loss, dec!(4000));
        assert_eq!(summary.gross_income, dec!(94000));
    }

    #[test]
    fn unknown_year_is_rejected() {
        let mut scenario = scenario();
        scenario.tax_year = 2019;

        let err = calculate_tax_year(&tables(), &scenario).unwrap_err();

        assert_eq!(
            err,
            TaxError::UnsupportedTaxYear {
                year: 2019,
                available: vec![2025],
            }
        );
    }

    #[test]
    fn missing_filing_status_is_rejected() {
        let mut scenario = scenario();
        scenario.filing_status = FilingStatusCode::HeadOfHousehold;

        let err = calculate_tax_year(&tables(), &scenario).unwrap_err();

        assert!(matches!(err, TaxError::InvalidFilingStatus { year: 2025, .. }));
    }

    #[test]
    fn invalid_scenario_is_rejected_before_calculation() {
        let mut scenario = scenario();
        scenario.deduct_mortgage_rate = dec!(-0.01);

        let err = calculate_tax_year(&tables(), &scenario).unwrap_err();

        assert!(matches!(err, TaxError::InvalidScenarioInput { .. }));
    }

    #[test]
    fn oversized_income_is_rejected_instead_of_overflowing() {
        let mut scenario = scenario();
        scenario.income_wages = Decimal::MAX;
        scenario.income_other = Decimal::MAX;

        let err = calculate_tax_year(&tables(), &scenario).unwrap_err();

        assert!(matches!(
            err,
            TaxError::InvalidScenarioInput { ref field, .. } if field == "income_wages"
        ));
    }

    #[test]
    fn calculate_tax_year_is_idempotent() {
        let tables = tables();
        let mut scenario = scenario();
        scenario.income_div = dec!(12000);
        scenario.income_div_qualified = dec!(9000);
        scenario.cg_long_term = dec!(55000);
        scenario.prior_carryforward.ma_capital_loss = dec!(1500);

        assert_eq!(
            calculate_tax_year(&tables, &scenario),
            calculate_tax_year(&tables, &scenario)
        );
    }
}
