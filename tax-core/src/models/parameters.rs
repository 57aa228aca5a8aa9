//! Year-specific tax-law parameters for both jurisdictions.
//!
//! The tables are plain data: a provider (see the `tax-data` crate) builds
//! them once and the engines only ever borrow them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::MAX_AMOUNT;
use crate::error::TaxError;
use crate::models::{FilingStatusCode, TaxBracket, validate_schedule};

/// Federal constants for one (year, filing status) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalParameters {
    pub ordinary_brackets: Vec<TaxBracket>,
    pub ltcg_brackets: Vec<TaxBracket>,
    pub standard_deduction: Decimal,
    pub salt_cap: Decimal,
    pub niit_threshold: Decimal,
    pub niit_rate: Decimal,
}

impl FederalParameters {
    pub fn validate(&self) -> Result<(), TaxError> {
        validate_schedule("federal ordinary brackets", &self.ordinary_brackets)?;
        validate_schedule("federal ltcg brackets", &self.ltcg_brackets)?;
        non_negative("federal standard_deduction", self.standard_deduction)?;
        non_negative("federal salt_cap", self.salt_cap)?;
        non_negative("federal niit_threshold", self.niit_threshold)?;
        rate("federal niit_rate", self.niit_rate)
    }
}

/// Massachusetts constants for one (year, filing status) pair.
///
/// MA taxes each income category at a flat rate; the surtax is added to
/// every category once AGI reaches `surtax_threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateParameters {
    pub ordinary_rate: Decimal,
    pub short_term_rate: Decimal,
    pub long_term_rate: Decimal,
    pub standard_exemption: Decimal,
    /// `None` (or zero) disables the surtax.
    pub surtax_threshold: Option<Decimal>,
    pub surtax_rate: Decimal,
    /// Maximum capital loss that may reduce interest/dividend income.
    pub max_investment_income_offset: Decimal,
}

impl StateParameters {
    pub fn validate(&self) -> Result<(), TaxError> {
        rate("state ordinary_rate", self.ordinary_rate)?;
        rate("state short_term_rate", self.short_term_rate)?;
        rate("state long_term_rate", self.long_term_rate)?;
        rate("state surtax_rate", self.surtax_rate)?;
        non_negative("state standard_exemption", self.standard_exemption)?;
        non_negative(
            "state max_investment_income_offset",
            self.max_investment_income_offset,
        )?;
        if let Some(threshold) = self.surtax_threshold {
            non_negative("state surtax_threshold", threshold)?;
        }
        Ok(())
    }
}

/// All parameters for a single tax year, keyed by filing status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearParameters {
    pub tax_year: i32,
    pub federal: BTreeMap<FilingStatusCode, FederalParameters>,
    pub state: BTreeMap<FilingStatusCode, StateParameters>,
}

impl TaxYearParameters {
    pub fn new(tax_year: i32) -> Self {
        Self {
            tax_year,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TaxError> {
        for params in self.federal.values() {
            params.validate()?;
        }
        for params in self.state.values() {
            params.validate()?;
        }
        Ok(())
    }

    pub fn federal(&self, status: FilingStatusCode) -> Result<&FederalParameters, TaxError> {
        self.federal
            .get(&status)
            .ok_or(TaxError::InvalidFilingStatus {
                year: self.tax_year,
                status,
                jurisdiction: "US",
            })
    }

    pub fn state(&self, status: FilingStatusCode) -> Result<&StateParameters, TaxError> {
        self.state
            .get(&status)
            .ok_or(TaxError::InvalidFilingStatus {
                year: self.tax_year,
                status,
                jurisdiction: "MA",
            })
    }
}

/// The full collection handed to the engines, keyed by tax year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTables {
    years: BTreeMap<i32, TaxYearParameters>,
}

impl ParameterTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a year after validating every schedule in it.
    pub fn insert(&mut self, year: TaxYearParameters) -> Result<(), TaxError> {
        year.validate()?;
        self.years.insert(year.tax_year, year);
        Ok(())
    }

    pub fn available_years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    pub fn year(&self, tax_year: i32) -> Result<&TaxYearParameters, TaxError> {
        self.years
            .get(&tax_year)
            .ok_or_else(|| TaxError::UnsupportedTaxYear {
                year: tax_year,
                available: self.available_years(),
            })
    }

    pub fn federal(
        &self,
        tax_year: i32,
        status: FilingStatusCode,
    ) -> Result<&FederalParameters, TaxError> {
        self.year(tax_year)?.federal(status)
    }

    pub fn state(
        &self,
        tax_year: i32,
        status: FilingStatusCode,
    ) -> Result<&StateParameters, TaxError> {
        self.year(tax_year)?.state(status)
    }
}

fn non_negative(name: &str, value: Decimal) -> Result<(), TaxError> {
    if value < Decimal::ZERO || value > MAX_AMOUNT {
        return Err(TaxError::MalformedParameterData {
            schedule: name.to_string(),
            reason: format!("must be between 0 and {MAX_AMOUNT}, got {value}"),
        });
    }
    Ok(())
}

fn rate(name: &str, value: Decimal) -> Result<(), TaxError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(TaxError::MalformedParameterData {
            schedule: name.to_string(),
            reason: format!("rate must be between 0 and 1, got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn federal() -> FederalParameters {
        FederalParameters {
            ordinary_brackets: vec![TaxBracket::flat(dec!(0.10))],
            ltcg_brackets: vec![TaxBracket::flat(dec!(0.15))],
            standard_deduction: dec!(30000),
            salt_cap: dec!(10000),
            niit_threshold: dec!(250000),
            niit_rate: dec!(0.038),
        }
    }

    fn state() -> StateParameters {
        StateParameters {
            ordinary_rate: dec!(0.05),
            short_term_rate: dec!(0.085),
            long_term_rate: dec!(0.05),
            standard_exemption: dec!(8800),
            surtax_threshold: Some(dec!(1000000)),
            surtax_rate: dec!(0.04),
            max_investment_income_offset: dec!(2000),
        }
    }

    fn tables() -> ParameterTables {
        let mut year = TaxYearParameters::new(2025);
        year.federal
            .insert(FilingStatusCode::MarriedFilingJointly, federal());
        year.state
            .insert(FilingStatusCode::MarriedFilingJointly, state());
        let mut tables = ParameterTables::new();
        tables.insert(year).unwrap();
        tables
    }

    #[test]
    fn lookup_returns_parameters_for_known_year_and_status() {
        let tables = tables();

        assert_eq!(
            tables.federal(2025, FilingStatusCode::MarriedFilingJointly),
            Ok(&federal())
        );
        assert_eq!(
            tables.state(2025, FilingStatusCode::MarriedFilingJointly),
            Ok(&state())
        );
    }

    #[test]
    fn lookup_fails_for_unknown_year() {
        let err = tables()
            .federal(2019, FilingStatusCode::MarriedFilingJointly)
            .unwrap_err();

        assert_eq!(
            err,
            TaxError::UnsupportedTaxYear {
                year: 2019,
                available: vec![2025],
            }
        );
    }

    #[test]
    fn lookup_fails_for_undefined_filing_status() {
        let err = tables()
            .state(2025, FilingStatusCode::Single)
            .unwrap_err();

        assert!(matches!(
            err,
            TaxError::InvalidFilingStatus {
                year: 2025,
                status: FilingStatusCode::Single,
                jurisdiction: "MA",
            }
        ));
    }

    #[test]
    fn insert_rejects_malformed_schedule() {
        let mut bad = federal();
        bad.ltcg_brackets = vec![];
        let mut year = TaxYearParameters::new(2024);
        year.federal.insert(FilingStatusCode::Single, bad);

        let result = ParameterTables::new().insert(year);

        assert!(matches!(
            result,
            Err(TaxError::MalformedParameterData { .. })
        ));
    }

    #[test]
    fn insert_rejects_out_of_range_state_rate() {
        let mut bad = state();
        bad.short_term_rate = dec!(8.5);
        let mut year = TaxYearParameters::new(2024);
        year.state.insert(FilingStatusCode::Single, bad);

        let err = ParameterTables::new().insert(year).unwrap_err();

        assert!(err.to_string().contains("short_term_rate"));
    }

    #[test]
    fn insert_rejects_oversized_standard_deduction() {
        let mut bad = federal();
        bad.standard_deduction = Decimal::MAX;
        let mut year = TaxYearParameters::new(2024);
        year.federal.insert(FilingStatusCode::Single, bad);

        let err = ParameterTables::new().insert(year).unwrap_err();

        assert!(err.to_string().contains("standard_deduction"));
    }

    #[test]
    fn available_years_are_sorted() {
        let mut tables = tables();
        tables.insert(TaxYearParameters::new(2023)).unwrap();

        assert_eq!(tables.available_years(), vec![2023, 2025]);
    }
}
