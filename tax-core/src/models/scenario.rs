use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::check_magnitude;
use crate::error::TaxError;
use crate::models::{CarryforwardState, FilingStatusCode};

/// Raw financial inputs for one household and one tax year.
///
/// Field names match the keys of the input file. Gains and losses are
/// signed (negative = loss); every expense field is non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,

    // Income
    #[serde(default)]
    pub income_wages: Decimal,
    #[serde(default)]
    pub income_int: Decimal,
    /// Total dividends, qualified portion included.
    #[serde(default)]
    pub income_div: Decimal,
    #[serde(default)]
    pub income_div_qualified: Decimal,
    #[serde(default)]
    pub income_inv_other: Decimal,
    #[serde(default)]
    pub income_other: Decimal,

    // Capital gains
    #[serde(default)]
    pub cg_short_term: Decimal,
    #[serde(default)]
    pub cg_long_term: Decimal,

    // Deduction candidates
    #[serde(default)]
    pub deduct_medical: Decimal,
    #[serde(default)]
    pub deduct_property_tax: Decimal,
    #[serde(default)]
    pub deduct_charity: Decimal,
    #[serde(default)]
    pub deduct_margin_int: Decimal,
    #[serde(default)]
    pub deduct_mortgage_int: Decimal,
    /// Annual rate as a fraction, e.g. `0.03375`.
    #[serde(default)]
    pub deduct_mortgage_rate: Decimal,
    #[serde(default)]
    pub deduct_mortgage_orig_year: i32,

    /// Overrides the MA standard exemption from the parameter table.
    #[serde(default)]
    pub custom_standard_deduction: Option<Decimal>,

    /// Amounts carried in from the previous tax year.
    #[serde(default)]
    pub prior_carryforward: CarryforwardState,
}

impl ScenarioInput {
    /// A zero-valued scenario for the given year and status.
    pub fn new(tax_year: i32, filing_status: FilingStatusCode) -> Self {
        Self {
            tax_year,
            filing_status,
            income_wages: Decimal::ZERO,
            income_int: Decimal::ZERO,
            income_div: Decimal::ZERO,
            income_div_qualified: Decimal::ZERO,
            income_inv_other: Decimal::ZERO,
            income_other: Decimal::ZERO,
            cg_short_term: Decimal::ZERO,
            cg_long_term: Decimal::ZERO,
            deduct_medical: Decimal::ZERO,
            deduct_property_tax: Decimal::ZERO,
            deduct_charity: Decimal::ZERO,
            deduct_margin_int: Decimal::ZERO,
            deduct_mortgage_int: Decimal::ZERO,
            deduct_mortgage_rate: Decimal::ZERO,
            deduct_mortgage_orig_year: 0,
            custom_standard_deduction: None,
            prior_carryforward: CarryforwardState::default(),
        }
    }

    pub fn amount(&self, field: ScenarioField) -> Decimal {
        match field {
            ScenarioField::IncomeWages => self.income_wages,
            ScenarioField::IncomeInt => self.income_int,
            ScenarioField::IncomeDiv => self.income_div,
            ScenarioField::IncomeDivQualified => self.income_div_qualified,
            ScenarioField::IncomeInvOther => self.income_inv_other,
            ScenarioField::IncomeOther => self.income_other,
            ScenarioField::CgShortTerm => self.cg_short_term,
            ScenarioField::CgLongTerm => self.cg_long_term,
            ScenarioField::DeductMedical => self.deduct_medical,
            ScenarioField::DeductPropertyTax => self.deduct_property_tax,
            ScenarioField::DeductCharity => self.deduct_charity,
            ScenarioField::DeductMarginInt => self.deduct_margin_int,
            ScenarioField::DeductMortgageInt => self.deduct_mortgage_int,
            ScenarioField::DeductMortgageRate => self.deduct_mortgage_rate,
        }
    }

    pub fn amount_mut(&mut self, field: ScenarioField) -> &mut Decimal {
        match field {
            ScenarioField::IncomeWages => &mut self.income_wages,
            ScenarioField::IncomeInt => &mut self.income_int,
            ScenarioField::IncomeDiv => &mut self.income_div,
            ScenarioField::IncomeDivQualified => &mut self.income_div_qualified,
            ScenarioField::IncomeInvOther => &mut self.income_inv_other,
            ScenarioField::IncomeOther => &mut self.income_other,
            ScenarioField::CgShortTerm => &mut self.cg_short_term,
            ScenarioField::CgLongTerm => &mut self.cg_long_term,
            ScenarioField::DeductMedical => &mut self.deduct_medical,
            ScenarioField::DeductPropertyTax => &mut self.deduct_property_tax,
            ScenarioField::DeductCharity => &mut self.deduct_charity,
            ScenarioField::DeductMarginInt => &mut self.deduct_margin_int,
            ScenarioField::DeductMortgageInt => &mut self.deduct_mortgage_int,
            ScenarioField::DeductMortgageRate => &mut self.deduct_mortgage_rate,
        }
    }

    /// Checks domain constraints the engines rely on.
    ///
    /// Income and gain fields may be negative; expenses, rates, the
    /// qualified-dividend portion and carryforwards may not. No amount may
    /// exceed [`MAX_AMOUNT`](crate::calculations::common::MAX_AMOUNT) in
    /// magnitude.
    pub fn validate(&self) -> Result<(), TaxError> {
        const NON_NEGATIVE: [ScenarioField; 7] = [
            ScenarioField::IncomeDivQualified,
            ScenarioField::DeductMedical,
            ScenarioField::DeductPropertyTax,
            ScenarioField::DeductCharity,
            ScenarioField::DeductMarginInt,
            ScenarioField::DeductMortgageInt,
            ScenarioField::DeductMortgageRate,
        ];

        for field in ScenarioField::ALL {
            check_magnitude(field.key(), self.amount(field))?;
        }

        for field in NON_NEGATIVE {
            let value = self.amount(field);
            if value < Decimal::ZERO {
                return Err(TaxError::invalid_input(
                    field.key(),
                    format!("must be non-negative, got {value}"),
                ));
            }
        }

        if self.income_div_qualified > self.income_div.max(Decimal::ZERO) {
            return Err(TaxError::invalid_input(
                ScenarioField::IncomeDivQualified.key(),
                format!(
                    "qualified dividends {} exceed total dividends {}",
                    self.income_div_qualified, self.income_div
                ),
            ));
        }

        if let Some(custom) = self.custom_standard_deduction {
            check_magnitude("custom_standard_deduction", custom)?;
            if custom < Decimal::ZERO {
                return Err(TaxError::invalid_input(
                    "custom_standard_deduction",
                    format!("must be non-negative, got {custom}"),
                ));
            }
        }

        if self.deduct_mortgage_orig_year < 0 {
            return Err(TaxError::invalid_input(
                "deduct_mortgage_orig_year",
                format!("must be a calendar year, got {}", self.deduct_mortgage_orig_year),
            ));
        }

        self.prior_carryforward.validate()
    }
}

/// The decimal-valued fields of [`ScenarioInput`], addressable by their
/// input-file key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioField {
    IncomeWages,
    IncomeInt,
    IncomeDiv,
    IncomeDivQualified,
    IncomeInvOther,
    IncomeOther,
    CgShortTerm,
    CgLongTerm,
    DeductMedical,
    DeductPropertyTax,
    DeductCharity,
    DeductMarginInt,
    DeductMortgageInt,
    DeductMortgageRate,
}

impl ScenarioField {
    pub const ALL: [ScenarioField; 14] = [
        Self::IncomeWages,
        Self::IncomeInt,
        Self::IncomeDiv,
        Self::IncomeDivQualified,
        Self::IncomeInvOther,
        Self::IncomeOther,
        Self::CgShortTerm,
        Self::CgLongTerm,
        Self::DeductMedical,
        Self::DeductPropertyTax,
        Self::DeductCharity,
        Self::DeductMarginInt,
        Self::DeductMortgageInt,
        Self::DeductMortgageRate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::IncomeWages => "income_wages",
            Self::IncomeInt => "income_int",
            Self::IncomeDiv => "income_div",
            Self::IncomeDivQualified => "income_div_qualified",
            Self::IncomeInvOther => "income_inv_other",
            Self::IncomeOther => "income_other",
            Self::CgShortTerm => "cg_short_term",
            Self::CgLongTerm => "cg_long_term",
            Self::DeductMedical => "deduct_medical",
            Self::DeductPropertyTax => "deduct_property_tax",
            Self::DeductCharity => "deduct_charity",
            Self::DeductMarginInt => "deduct_margin_int",
            Self::DeductMortgageInt => "deduct_mortgage_int",
            Self::DeductMortgageRate => "deduct_mortgage_rate",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for ScenarioField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
