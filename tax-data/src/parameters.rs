use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    FederalParameters, FilingStatusCode, ParameterTables, StateParameters, TaxBracket, TaxError,
    TaxYearParameters,
};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading the parameter file.
#[derive(Debug, Error)]
pub enum ParameterLoaderError {
    #[error("Failed to read parameter file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Unknown filing status '{status}' in tax year {year}")]
    UnknownFilingStatus { year: i32, status: String },

    #[error("Filing status {status} defined twice for tax year {year} ({jurisdiction})")]
    DuplicateStatus {
        year: i32,
        status: FilingStatusCode,
        jurisdiction: &'static str,
    },

    #[error("Tax year {year} defines {status} for {present} but not for {missing}")]
    MissingJurisdiction {
        year: i32,
        status: FilingStatusCode,
        present: &'static str,
        missing: &'static str,
    },

    #[error("Tax year {0} defined more than once")]
    DuplicateYear(i32),

    #[error(transparent)]
    Invalid(#[from] TaxError),
}

impl From<toml::de::Error> for ParameterLoaderError {
    fn from(err: toml::de::Error) -> Self {
        ParameterLoaderError::TomlParse(err.to_string())
    }
}

/// A single bracket as written in the file. `max` is omitted for the open
/// top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub min: Decimal,
    #[serde(default)]
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl From<&BracketRecord> for TaxBracket {
    fn from(record: &BracketRecord) -> Self {
        TaxBracket::new(record.min, record.max, record.rate)
    }
}

/// Federal values shared by one or more filing statuses.
///
/// Statuses that use the same schedule (MFJ and QSS) are listed together.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FederalRecord {
    pub statuses: Vec<String>,
    pub standard_deduction: Decimal,
    pub salt_cap: Decimal,
    pub niit_threshold: Decimal,
    pub niit_rate: Decimal,
    pub ordinary_brackets: Vec<BracketRecord>,
    pub ltcg_brackets: Vec<BracketRecord>,
}

/// Massachusetts values. Everything except the exemption is usually the
/// same for every status, so `[year.state_defaults]` supplies it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateRecord {
    pub statuses: Vec<String>,
    pub standard_exemption: Decimal,
    pub ordinary_rate: Option<Decimal>,
    pub short_term_rate: Option<Decimal>,
    pub long_term_rate: Option<Decimal>,
    pub surtax_threshold: Option<Decimal>,
    pub surtax_rate: Option<Decimal>,
    pub max_investment_income_offset: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StateDefaults {
    #[serde(default)]
    pub ordinary_rate: Decimal,
    #[serde(default)]
    pub short_term_rate: Decimal,
    #[serde(default)]
    pub long_term_rate: Decimal,
    pub surtax_threshold: Option<Decimal>,
    #[serde(default)]
    pub surtax_rate: Decimal,
    #[serde(default)]
    pub max_investment_income_offset: Decimal,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct YearRecord {
    pub tax_year: i32,
    #[serde(default)]
    pub federal: Vec<FederalRecord>,
    #[serde(default)]
    pub state_defaults: StateDefaults,
    #[serde(default)]
    pub state: Vec<StateRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParameterFile {
    #[serde(rename = "year", default)]
    pub years: Vec<YearRecord>,
}

/// Loader for the year parameter tables.
///
/// The file is TOML with one `[[year]]` table per tax year; see
/// `data/tax_parameters.toml`. Every schedule is validated while the
/// tables are built, so a loaded [`ParameterTables`] is always usable by the
/// engines.
pub struct ParameterLoader;

impl ParameterLoader {
    /// Parse parameter tables from TOML text.
    pub fn parse(text: &str) -> Result<ParameterTables, ParameterLoaderError> {
        let file: ParameterFile = toml::from_str(text)?;

        let mut tables = ParameterTables::new();
        let mut seen = Vec::new();
        for record in &file.years {
            if seen.contains(&record.tax_year) {
                return Err(ParameterLoaderError::DuplicateYear(record.tax_year));
            }
            seen.push(record.tax_year);

            let year = build_year(record)?;
            debug!(
                tax_year = year.tax_year,
                federal_statuses = year.federal.len(),
                state_statuses = year.state.len(),
                "loaded tax year parameters"
            );
            tables.insert(year)?;
        }

        Ok(tables)
    }

    /// Read and parse the parameter file at `path`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<ParameterTables, ParameterLoaderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParameterLoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }
}

fn parse_statuses(
    year: i32,
    codes: &[String],
) -> Result<Vec<FilingStatusCode>, ParameterLoaderError> {
    codes
        .iter()
        .map(|code| {
            FilingStatusCode::parse(code).ok_or_else(|| ParameterLoaderError::UnknownFilingStatus {
                year,
                status: code.clone(),
            })
        })
        .collect()
}

fn build_year(record: &YearRecord) -> Result<TaxYearParameters, ParameterLoaderError> {
    let mut year = TaxYearParameters::new(record.tax_year);

    for federal in &record.federal {
        let params = FederalParameters {
            ordinary_brackets: federal.ordinary_brackets.iter().map(TaxBracket::from).collect(),
            ltcg_brackets: federal.ltcg_brackets.iter().map(TaxBracket::from).collect(),
            standard_deduction: federal.standard_deduction,
            salt_cap: federal.salt_cap,
            niit_threshold: federal.niit_threshold,
            niit_rate: federal.niit_rate,
        };
        for status in parse_statuses(record.tax_year, &federal.statuses)? {
            insert_once(&mut year.federal, record.tax_year, status, "US", params.clone())?;
        }
    }

    let defaults = &record.state_defaults;
    for state in &record.state {
        let params = StateParameters {
            ordinary_rate: state.ordinary_rate.unwrap_or(defaults.ordinary_rate),
            short_term_rate: state.short_term_rate.unwrap_or(defaults.short_term_rate),
            long_term_rate: state.long_term_rate.unwrap_or(defaults.long_term_rate),
            standard_exemption: state.standard_exemption,
            surtax_threshold: state.surtax_threshold.or(defaults.surtax_threshold),
            surtax_rate: state.surtax_rate.unwrap_or(defaults.surtax_rate),
            max_investment_income_offset: state
                .max_investment_income_offset
                .unwrap_or(defaults.max_investment_income_offset),
        };
        for status in parse_statuses(record.tax_year, &state.statuses)? {
            insert_once(&mut year.state, record.tax_year, status, "MA", params.clone())?;
        }
    }

    check_jurisdictions_match(&year)?;
    Ok(year)
}

fn insert_once<T>(
    map: &mut BTreeMap<FilingStatusCode, T>,
    year: i32,
    status: FilingStatusCode,
    jurisdiction: &'static str,
    value: T,
) -> Result<(), ParameterLoaderError> {
    if map.insert(status, value).is_some() {
        return Err(ParameterLoaderError::DuplicateStatus {
            year,
            status,
            jurisdiction,
        });
    }
    Ok(())
}

/// A status defined for only one jurisdiction could never be computed.
fn check_jurisdictions_match(year: &TaxYearParameters) -> Result<(), ParameterLoaderError> {
    for status in year.federal.keys() {
        if !year.state.contains_key(status) {
            return Err(ParameterLoaderError::MissingJurisdiction {
                year: year.tax_year,
                status: *status,
                present: "US",
                missing: "MA",
            });
        }
    }
    for status in year.state.keys() {
        if !year.federal.contains_key(status) {
            return Err(ParameterLoaderError::MissingJurisdiction {
                year: year.tax_year,
                status: *status,
                present: "MA",
                missing: "US",
            });
        }
    }
    Ok(())
}
