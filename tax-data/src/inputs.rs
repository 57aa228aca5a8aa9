//! `key=value` input files.
//!
//! ```text
//! # 2025 household
//! tax_year=2025
//! filing_status=MFJ
//! income_wages=185000    # both W-2s
//! ```
//!
//! A leading `N|` line number is stripped, `#` starts a comment and blank
//! lines are ignored. Every value except `filing_status` must be numeric and
//! non-empty.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tax_core::{CarryforwardState, FilingStatusCode, ScenarioField, ScenarioInput, TaxError};
use thiserror::Error;
use tracing::trace;

const TAX_YEAR: &str = "tax_year";
const FILING_STATUS: &str = "filing_status";
const MORTGAGE_ORIG_YEAR: &str = "deduct_mortgage_orig_year";
const CUSTOM_STANDARD_DEDUCTION: &str = "custom_standard_deduction";

#[derive(Debug, Error)]
pub enum InputFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Line {line}: expected key=value, got '{text}'")]
    MalformedLine { line: usize, text: String },

    #[error("Line {line}: key '{key}' appears more than once")]
    DuplicateKey { line: usize, key: String },

    #[error("{0} cannot be empty")]
    EmptyValue(String),

    #[error("{key} must be a valid number, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("{key} must be a whole year, got '{value}'")]
    InvalidYear { key: String, value: String },

    #[error("Unknown filing status '{0}'")]
    UnknownFilingStatus(String),

    #[error("Input file validation failed. Missing keys: {missing:?}. Extra keys: {extra:?}.")]
    KeyMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error(transparent)]
    Invalid(#[from] TaxError),
}

/// Raw `key -> value` pairs in file order, comments stripped.
pub fn parse_pairs(text: &str) -> Result<BTreeMap<String, String>, InputFileError> {
    let mut pairs = BTreeMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = strip_line_number(raw);
        let line = line.split_once('#').map_or(line, |(content, _)| content).trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(InputFileError::MalformedLine {
                line: line_number,
                text: line.to_string(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(InputFileError::MalformedLine {
                line: line_number,
                text: line.to_string(),
            });
        }

        trace!(line = line_number, key, value = value.trim(), "input pair");
        if pairs
            .insert(key.to_string(), value.trim().to_string())
            .is_some()
        {
            return Err(InputFileError::DuplicateKey {
                line: line_number,
                key: key.to_string(),
            });
        }
    }

    Ok(pairs)
}

fn strip_line_number(line: &str) -> &str {
    match line.split_once('|') {
        Some((prefix, rest))
            if !prefix.trim().is_empty() && prefix.trim().chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => line,
    }
}

/// Keys a current-year input file must contain.
pub fn scenario_keys() -> BTreeSet<&'static str> {
    let mut keys: BTreeSet<&'static str> = ScenarioField::ALL.iter().map(|f| f.key()).collect();
    keys.insert(TAX_YEAR);
    keys.insert(FILING_STATUS);
    keys.insert(MORTGAGE_ORIG_YEAR);
    keys
}

fn check_keys(
    pairs: &BTreeMap<String, String>,
    required: &BTreeSet<&'static str>,
    optional: &[&str],
) -> Result<(), InputFileError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|key| !pairs.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    let extra: Vec<String> = pairs
        .keys()
        .filter(|key| !required.contains(key.as_str()) && !optional.contains(&key.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(InputFileError::KeyMismatch { missing, extra })
    }
}

fn decimal(
    key: &str,
    value: &str,
) -> Result<Decimal, InputFileError> {
    if value.is_empty() {
        return Err(InputFileError::EmptyValue(key.to_string()));
    }
    value
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| InputFileError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn year(
    key: &str,
    value: &str,
) -> Result<i32, InputFileError> {
    let amount = decimal(key, value)?;
    if !amount.fract().is_zero() {
        return Err(InputFileError::InvalidYear {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    amount.to_i32().ok_or_else(|| InputFileError::InvalidYear {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses a current-year input file into a scenario.
///
/// The file must hold exactly the keys of [`scenario_keys`];
/// `custom_standard_deduction` may also appear. The prior carryforward is
/// left at zero: it comes from the carryforward record, not this file.
pub fn parse_scenario(text: &str) -> Result<ScenarioInput, InputFileError> {
    let pairs = parse_pairs(text)?;
    check_keys(&pairs, &scenario_keys(), &[CUSTOM_STANDARD_DEDUCTION])?;

    let value = |key: &str| pairs.get(key).map(String::as_str).unwrap_or_default();

    let tax_year = year(TAX_YEAR, value(TAX_YEAR))?;
    let status_text = value(FILING_STATUS);
    let filing_status = FilingStatusCode::parse(status_text)
        .ok_or_else(|| InputFileError::UnknownFilingStatus(status_text.to_string()))?;

    let mut scenario = ScenarioInput::new(tax_year, filing_status);
    for field in ScenarioField::ALL {
        *scenario.amount_mut(field) = decimal(field.key(), value(field.key()))?;
    }
    scenario.deduct_mortgage_orig_year = year(MORTGAGE_ORIG_YEAR, value(MORTGAGE_ORIG_YEAR))?;
    scenario.custom_standard_deduction = pairs
        .get(CUSTOM_STANDARD_DEDUCTION)
        .map(|custom| decimal(CUSTOM_STANDARD_DEDUCTION, custom))
        .transpose()?;

    Ok(scenario)
}

/// Parses a carryforward record holding exactly the four carryforward keys.
pub fn parse_carryforward(text: &str) -> Result<CarryforwardState, InputFileError> {
    let pairs = parse_pairs(text)?;
    check_keys(&pairs, &CarryforwardState::KEYS.into_iter().collect(), &[])?;

    let mut state = CarryforwardState::default();
    for (key, value) in &pairs {
        state.set(key, decimal(key, value)?);
    }
    state.validate()?;

    Ok(state)
}

/// Writes a carryforward record in the format [`parse_carryforward`] reads.
pub fn render_carryforward(state: &CarryforwardState) -> String {
    CarryforwardState::KEYS
        .iter()
        .map(|key| format!("{key}={}\n", state.get(key).unwrap_or_default()))
        .collect()
}

/// Reads and parses a current-year input file.
pub async fn load_scenario_file(path: impl AsRef<Path>) -> Result<ScenarioInput, InputFileError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
    parse_scenario(&text)
}
