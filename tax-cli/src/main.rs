use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tax_cli::{app, logging, report};
use tax_data::{FileCarryforwardRepository, ParameterLoader, ScenarioLoader, load_scenario_file};
use tracing::{debug, info};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Massachusetts and US federal income tax calculator.
///
/// Loads year parameter tables and a household's inputs, applies the stored
/// capital-loss carryforward, and prints both jurisdictions' results.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Year parameter tables (TOML).
    #[arg(long, global = true, default_value = "data/tax_parameters.toml")]
    parameters: PathBuf,

    /// Directory holding `<year>_carryforward.dat` records.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Log filter, e.g. `debug` or `info,tax_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate one tax year and record next year's carryforward.
    Calc {
        /// Key=value input file.
        inputs: PathBuf,
    },
    /// Evaluate what-if adjustments against a base input file.
    Scenarios {
        /// Key=value base input file.
        inputs: PathBuf,
        /// Scenario CSV.
        scenarios: PathBuf,
        /// Write outcomes to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let tables = ParameterLoader::load_from_file(&cli.parameters)
        .with_context(|| format!("loading parameters from {}", cli.parameters.display()))?;
    debug!(years = ?tables.available_years(), "parameters loaded");
    let repo = FileCarryforwardRepository::new(&cli.data_dir);

    match cli.command {
        Command::Calc { inputs } => {
            let scenario = load_scenario_file(&inputs)
                .await
                .with_context(|| format!("reading {}", inputs.display()))?;
            let run = app::run_tax_year(&tables, &repo, scenario).await?;
            print!("{}", report::full_report(&run.summary));
        }
        Command::Scenarios {
            inputs,
            scenarios,
            output,
        } => {
            let base = load_scenario_file(&inputs)
                .await
                .with_context(|| format!("reading {}", inputs.display()))?;
            let what_ifs = ScenarioLoader::load_from_file(&scenarios)
                .with_context(|| format!("reading {}", scenarios.display()))?;

            let outcomes = app::run_scenarios(&tables, &repo, base, &what_ifs).await?;
            for outcome in &outcomes {
                println!("{}", report::scenario_line(outcome));
            }

            if let Some(path) = output {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                report::write_outcomes_csv(file, &outcomes)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), rows = outcomes.len(), "scenario outcomes written");
            }
        }
    }

    Ok(())
}
