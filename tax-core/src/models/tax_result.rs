use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::FilingStatusCode;

/// Which deduction the federal engine applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionType {
    Standard,
    Itemized,
}

impl fmt::Display for DeductionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Itemized => f.write_str("itemized"),
        }
    }
}

/// Massachusetts result. Money is rounded to cents, rates to basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxResult {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,

    pub agi: Decimal,
    pub standard_exemption: Decimal,
    /// Capital loss applied against interest/dividend income.
    pub investment_income_offset: Decimal,

    pub taxable_income: Decimal,
    pub taxable_ordinary: Decimal,
    pub taxable_short_term: Decimal,
    pub taxable_long_term: Decimal,

    pub ordinary_tax: Decimal,
    pub short_term_tax: Decimal,
    pub long_term_tax: Decimal,
    pub total_tax: Decimal,

    pub is_surtax: bool,
    /// Category rates, surtax included.
    pub ordinary_rate: Decimal,
    pub short_term_rate: Decimal,
    pub long_term_rate: Decimal,
    /// Total tax over taxable income.
    pub effective_rate: Decimal,

    pub capital_loss_carryforward: Decimal,
}

/// US federal result. Money is rounded to cents, rates to basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalTaxResult {
    pub tax_year: i32,
    pub filing_status: FilingStatusCode,

    /// Ordinary income after capital-gain netting, before deductions.
    pub gross_ordinary_income: Decimal,
    /// Net long-term position after netting and carryforward (may be negative).
    pub gross_ltcg: Decimal,
    pub capital_loss_deduction: Decimal,
    pub agi: Decimal,

    pub salt_deduction: Decimal,
    pub mortgage_interest_deduction: Decimal,
    pub investment_interest_deduction: Decimal,
    pub medical_deduction: Decimal,
    pub charitable_deduction: Decimal,
    pub itemized_deductions: Decimal,
    pub standard_deduction: Decimal,
    pub total_deductions: Decimal,
    pub deduction_used: DeductionType,

    pub taxable_income: Decimal,
    pub taxable_ordinary_income: Decimal,
    pub taxable_ltcg_income: Decimal,

    pub ordinary_tax: Decimal,
    pub ltcg_tax: Decimal,
    pub niit_tax: Decimal,
    pub total_tax: Decimal,

    pub effective_tax_rate: Decimal,
    pub effective_tax_rate_agi: Decimal,
    pub marginal_tax_rate: Decimal,
    /// LTCG tax over taxable capital gains.
    pub ltcg_tax_rate: Decimal,

    pub investment_interest_carryforward: Decimal,
    pub short_term_loss_carryforward: Decimal,
    pub long_term_loss_carryforward: Decimal,
}
