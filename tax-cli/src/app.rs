//! Command workflows shared by the binary and its tests.

use anyhow::{Context, Result};
use tax_core::calculations::{TaxYearSummary, calculate_tax_year};
use tax_core::db::load_or_default;
use tax_core::{CarryforwardRepository, CarryforwardState, ParameterTables, ScenarioInput};
use tax_data::WhatIfScenario;
use tracing::{debug, info};

/// Outcome of a `calc` run.
#[derive(Debug, Clone)]
pub struct TaxYearRun {
    pub summary: TaxYearSummary,
    /// True when no carryforward record existed for the input year.
    pub carryforward_created: bool,
}

/// Outcome of one what-if scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub description: String,
    pub summary: TaxYearSummary,
}

/// Computes one tax year against the stored carryforward and records the
/// carryforward for the following year.
///
/// A missing record for the input year is created as all zeros before the
/// calculation runs.
pub async fn run_tax_year(
    tables: &ParameterTables,
    repo: &dyn CarryforwardRepository,
    mut scenario: ScenarioInput,
) -> Result<TaxYearRun> {
    let tax_year = scenario.tax_year;

    let (prior, carryforward_created) = load_or_default(repo, tax_year)
        .await
        .with_context(|| format!("loading {tax_year} carryforward"))?;
    if carryforward_created {
        repo.save(tax_year, &CarryforwardState::default())
            .await
            .with_context(|| format!("initialising {tax_year} carryforward"))?;
        info!(tax_year, "created empty carryforward record");
    }

    scenario.prior_carryforward = prior;
    let summary = calculate_tax_year(tables, &scenario)
        .with_context(|| format!("calculating {tax_year} {}", scenario.filing_status))?;

    let next_year = tax_year + 1;
    repo.save(next_year, &summary.next_carryforward)
        .await
        .with_context(|| format!("saving {next_year} carryforward"))?;
    info!(tax_year = next_year, state = ?summary.next_carryforward, "saved carryforward");

    Ok(TaxYearRun {
        summary,
        carryforward_created,
    })
}

/// Evaluates every scenario against the same base input.
///
/// The stored carryforward for the base year is read but never written:
/// what-if runs must not disturb the real record.
pub async fn run_scenarios(
    tables: &ParameterTables,
    repo: &dyn CarryforwardRepository,
    mut base: ScenarioInput,
    scenarios: &[WhatIfScenario],
) -> Result<Vec<ScenarioOutcome>> {
    let (prior, _) = load_or_default(repo, base.tax_year)
        .await
        .with_context(|| format!("loading {} carryforward", base.tax_year))?;
    base.prior_carryforward = prior;

    scenarios
        .iter()
        .map(|scenario| {
            debug!(description = %scenario.description, "evaluating scenario");
            let summary = calculate_tax_year(tables, &scenario.apply(&base))
                .with_context(|| format!("scenario '{}'", scenario.description))?;
            Ok(ScenarioOutcome {
                description: scenario.description.clone(),
                summary,
            })
        })
        .collect()
}
