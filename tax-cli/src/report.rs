//! Plain-text and CSV rendering of calculation results.

use std::io;

use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::calculations::TaxYearSummary;
use tax_core::{DeductionType, FederalTaxResult, StateTaxResult};

use crate::app::ScenarioOutcome;

const LABEL_WIDTH: usize = 34;

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Fractional rate rendered as a percentage with two decimals.
fn percent(rate: Decimal) -> String {
    format!("{:.2}%", rate * Decimal::ONE_HUNDRED)
}

fn line(
    out: &mut String,
    label: &str,
    value: impl AsRef<str>,
) {
    out.push_str(&format!("  {label:<LABEL_WIDTH$}{:>14}\n", value.as_ref()));
}

fn heading(
    out: &mut String,
    title: &str,
) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.len()));
    out.push('\n');
}

pub fn state_report(result: &StateTaxResult) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("Massachusetts {} ({})", result.tax_year, result.filing_status),
    );
    line(&mut out, "AGI", money(result.agi));
    line(&mut out, "Standard exemption", money(result.standard_exemption));
    line(&mut out, "Investment income loss offset", money(result.investment_income_offset));
    line(&mut out, "Taxable ordinary", money(result.taxable_ordinary));
    line(&mut out, "Taxable short-term gains", money(result.taxable_short_term));
    line(&mut out, "Taxable long-term gains", money(result.taxable_long_term));
    line(&mut out, "Taxable income", money(result.taxable_income));
    line(
        &mut out,
        &format!("Ordinary tax @ {}", percent(result.ordinary_rate)),
        money(result.ordinary_tax),
    );
    line(
        &mut out,
        &format!("Short-term tax @ {}", percent(result.short_term_rate)),
        money(result.short_term_tax),
    );
    line(
        &mut out,
        &format!("Long-term tax @ {}", percent(result.long_term_rate)),
        money(result.long_term_tax),
    );
    line(&mut out, "Surtax applied", if result.is_surtax { "yes" } else { "no" });
    line(&mut out, "Total tax", money(result.total_tax));
    line(&mut out, "Effective rate", percent(result.effective_rate));
    line(&mut out, "Capital loss carryforward", money(result.capital_loss_carryforward));
    out
}

pub fn federal_report(result: &FederalTaxResult) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("US federal {} ({})", result.tax_year, result.filing_status),
    );
    line(&mut out, "Gross ordinary income", money(result.gross_ordinary_income));
    line(&mut out, "Net long-term gain", money(result.gross_ltcg));
    line(&mut out, "Capital loss deduction", money(result.capital_loss_deduction));
    line(&mut out, "AGI", money(result.agi));
    line(&mut out, "SALT", money(result.salt_deduction));
    line(&mut out, "Mortgage interest", money(result.mortgage_interest_deduction));
    line(&mut out, "Investment interest", money(result.investment_interest_deduction));
    line(&mut out, "Medical", money(result.medical_deduction));
    line(&mut out, "Charity", money(result.charitable_deduction));
    line(&mut out, "Itemized total", money(result.itemized_deductions));
    line(&mut out, "Standard deduction", money(result.standard_deduction));
    line(
        &mut out,
        &format!("Deduction used ({})", result.deduction_used),
        money(result.total_deductions),
    );
    line(&mut out, "Taxable ordinary income", money(result.taxable_ordinary_income));
    line(&mut out, "Taxable capital gains", money(result.taxable_ltcg_income));
    line(&mut out, "Taxable income", money(result.taxable_income));
    line(&mut out, "Ordinary tax", money(result.ordinary_tax));
    line(
        &mut out,
        &format!("Capital gains tax @ {}", percent(result.ltcg_tax_rate)),
        money(result.ltcg_tax),
    );
    line(&mut out, "Net investment income tax", money(result.niit_tax));
    line(&mut out, "Total tax", money(result.total_tax));
    line(&mut out, "Marginal rate", percent(result.marginal_tax_rate));
    line(&mut out, "Effective rate (taxable)", percent(result.effective_tax_rate));
    line(&mut out, "Effective rate (AGI)", percent(result.effective_tax_rate_agi));
    line(
        &mut out,
        "Investment interest carryforward",
        money(result.investment_interest_carryforward),
    );
    line(&mut out, "Short-term loss carryforward", money(result.short_term_loss_carryforward));
    line(&mut out, "Long-term loss carryforward", money(result.long_term_loss_carryforward));
    out
}

pub fn combined_report(summary: &TaxYearSummary) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Combined {}", summary.state.tax_year));
    line(&mut out, "Gross income", money(summary.gross_income));
    line(&mut out, "Massachusetts tax", money(summary.state.total_tax));
    line(&mut out, "US federal tax", money(summary.federal.total_tax));
    line(&mut out, "Total tax", money(summary.total_tax));
    line(&mut out, "Total tax rate", percent(summary.total_tax_rate));
    line(&mut out, "Net income", money(summary.net_income));
    out
}

/// All three reports separated by blank lines.
pub fn full_report(summary: &TaxYearSummary) -> String {
    [
        state_report(&summary.state),
        federal_report(&summary.federal),
        combined_report(summary),
    ]
    .join("\n")
}

/// One line per what-if scenario: combined tax, net, and the federal
/// taxable-income split.
pub fn scenario_line(outcome: &ScenarioOutcome) -> String {
    let summary = &outcome.summary;
    format!(
        "{:<30} tax {:>11} ({:>6} of {:>12})  net {:>12}  [taxable {:>12} ord {:>12} ltcg {:>12}]",
        outcome.description,
        money(summary.total_tax),
        percent(summary.total_tax_rate),
        money(summary.gross_income),
        money(summary.net_income),
        money(summary.federal.taxable_income),
        money(summary.federal.taxable_ordinary_income),
        money(summary.federal.taxable_ltcg_income),
    )
}

#[derive(Debug, Serialize)]
struct OutcomeRow<'a> {
    description: &'a str,
    gross_income: Decimal,
    ma_agi: Decimal,
    ma_tax: Decimal,
    us_agi: Decimal,
    us_taxable_income: Decimal,
    us_deduction: DeductionType,
    us_tax: Decimal,
    total_tax: Decimal,
    total_tax_rate: Decimal,
    net_income: Decimal,
    ma_capital_loss_carryforward: Decimal,
    us_inv_int_carryforward: Decimal,
    us_short_term_loss_carryforward: Decimal,
    us_long_term_loss_carryforward: Decimal,
}

impl<'a> From<&'a ScenarioOutcome> for OutcomeRow<'a> {
    fn from(outcome: &'a ScenarioOutcome) -> Self {
        let summary = &outcome.summary;
        let carryforward = &summary.next_carryforward;
        Self {
            description: &outcome.description,
            gross_income: summary.gross_income,
            ma_agi: summary.state.agi,
            ma_tax: summary.state.total_tax,
            us_agi: summary.federal.agi,
            us_taxable_income: summary.federal.taxable_income,
            us_deduction: summary.federal.deduction_used,
            us_tax: summary.federal.total_tax,
            total_tax: summary.total_tax,
            total_tax_rate: summary.total_tax_rate,
            net_income: summary.net_income,
            ma_capital_loss_carryforward: carryforward.ma_capital_loss,
            us_inv_int_carryforward: carryforward.us_investment_interest,
            us_short_term_loss_carryforward: carryforward.us_short_term_loss,
            us_long_term_loss_carryforward: carryforward.us_long_term_loss,
        }
    }
}

/// Writes one CSV row per scenario outcome, with a header.
pub fn write_outcomes_csv<W: io::Write>(
    writer: W,
    outcomes: &[ScenarioOutcome],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for outcome in outcomes {
        csv_writer.serialize(OutcomeRow::from(outcome))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_money_and_percent() {
        assert_eq!(money(dec!(25023.1)), "25023.10");
        assert_eq!(money(dec!(0)), "0.00");
        assert_eq!(percent(dec!(0.1685)), "16.85%");
        assert_eq!(percent(dec!(0.05)), "5.00%");
    }

    #[test]
    fn test_line_alignment() {
        let mut out = String::new();

        line(&mut out, "AGI", "100.00");

        assert_eq!(out.len(), 2 + LABEL_WIDTH + 14 + 1);
        assert!(out.starts_with("  AGI "));
        assert!(out.ends_with("100.00\n"));
    }

    #[test]
    fn test_heading_underlines_title() {
        let mut out = String::new();

        heading(&mut out, "Combined 2025");
        line(&mut out, "Total tax", "1.00");

        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Combined 2025"));
        assert_eq!(lines.next(), Some("-------------"));
        assert!(lines.next().is_some_and(|l| l.starts_with("  Total tax")));
        assert_eq!(lines.next(), None);
    }
}
