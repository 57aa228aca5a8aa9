use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use tax_core::{ScenarioField, ScenarioInput};
use thiserror::Error;
use tracing::debug;

const DESCRIPTION: &str = "description";

/// Errors that can occur when loading a what-if scenario file.
#[derive(Debug, Error)]
pub enum ScenarioFileError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Scenario file has no 'description' column")]
    MissingDescription,

    #[error("Unknown scenario column '{0}'")]
    UnknownColumn(String),

    #[error("Row {row}, column '{column}': invalid adjustment '{value}'")]
    InvalidAdjustment {
        row: usize,
        column: String,
        value: String,
    },
}

impl From<csv::Error> for ScenarioFileError {
    fn from(err: csv::Error) -> Self {
        ScenarioFileError::CsvParse(err.to_string())
    }
}

/// Change to one base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// `+N`
    Add(Decimal),
    /// `-N`
    Subtract(Decimal),
    /// `N`
    Replace(Decimal),
}

impl Adjustment {
    /// Parses a cell. An empty cell means no adjustment.
    pub fn parse(cell: &str) -> Option<Result<Self, String>> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }

        let (make, digits): (fn(Decimal) -> Self, &str) = match cell.as_bytes()[0] {
            b'+' => (Self::Add, &cell[1..]),
            b'-' => (Self::Subtract, &cell[1..]),
            _ => (Self::Replace, cell),
        };
        let digits = digits.trim();
        let parsed = match digits.chars().next() {
            Some('+') | Some('-') | None => None,
            Some(_) => digits.parse::<Decimal>().ok(),
        };
        Some(parsed.map(make).ok_or_else(|| cell.to_string()))
    }

    /// Saturates at the `Decimal` range; the scenario's own validation
    /// then rejects the out-of-range amount.
    pub fn apply(
        &self,
        base: Decimal,
    ) -> Decimal {
        match self {
            Self::Add(delta) => base.saturating_add(*delta),
            Self::Subtract(delta) => base.saturating_sub(*delta),
            Self::Replace(value) => *value,
        }
    }
}

/// One row of the scenario file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatIfScenario {
    pub description: String,
    pub adjustments: Vec<(ScenarioField, Adjustment)>,
}

impl WhatIfScenario {
    /// A copy of `base` with this scenario's adjustments applied.
    pub fn apply(&self, base: &ScenarioInput) -> ScenarioInput {
        let mut scenario = base.clone();
        for (field, adjustment) in &self.adjustments {
            let slot = scenario.amount_mut(*field);
            *slot = adjustment.apply(*slot);
        }
        scenario
    }
}

/// Loader for what-if scenario CSV files.
///
/// The header holds a `description` column plus one column per adjustable
/// field, named by its input-file key:
///
/// ```text
/// description,income_other,cg_short_term,cg_long_term
/// Base case,,,
/// Sell the winners,,+20000,250000
/// ```
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<WhatIfScenario>, ScenarioFileError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut description_index = None;
        let mut columns = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if header.eq_ignore_ascii_case(DESCRIPTION) {
                description_index = Some(index);
            } else {
                let field = ScenarioField::parse(header)
                    .ok_or_else(|| ScenarioFileError::UnknownColumn(header.to_string()))?;
                columns.push((index, field));
            }
        }
        let description_index = description_index.ok_or(ScenarioFileError::MissingDescription)?;

        let mut scenarios = Vec::new();
        for (row_index, result) in csv_reader.records().enumerate() {
            let record = result?;
            let row = row_index + 1;

            let mut adjustments = Vec::new();
            for (index, field) in &columns {
                let cell = record.get(*index).unwrap_or_default();
                match Adjustment::parse(cell) {
                    None => {}
                    Some(Ok(adjustment)) => adjustments.push((*field, adjustment)),
                    Some(Err(value)) => {
                        return Err(ScenarioFileError::InvalidAdjustment {
                            row,
                            column: field.key().to_string(),
                            value,
                        });
                    }
                }
            }

            scenarios.push(WhatIfScenario {
                description: record.get(description_index).unwrap_or_default().to_string(),
                adjustments,
            });
        }

        debug!(count = scenarios.len(), "parsed what-if scenarios");
        Ok(scenarios)
    }

    pub fn load_from_file(
        path: impl AsRef<Path>,
    ) -> Result<Vec<WhatIfScenario>, ScenarioFileError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ScenarioFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(file)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::FilingStatusCode;

    use super::*;

    const TEST_CSV: &str = "\
description,income_other,cg_short_term,cg_long_term
Base case,+0,+0,0
Aggressive,,360000,250000
Blend,+100000,-5000,
";

    fn base() -> ScenarioInput {
        let mut base = ScenarioInput::new(2025, FilingStatusCode::MarriedFilingJointly);
        base.income_other = dec!(20000);
        base.cg_short_term = dec!(10000);
        base.cg_long_term = dec!(40000);
        base
    }

    // =========================================================================
    // Adjustment tests
    // =========================================================================

    #[test]
    fn test_adjustment_parse() {
        assert_eq!(Adjustment::parse(""), None);
        assert_eq!(Adjustment::parse("  "), None);
        assert_eq!(Adjustment::parse("+150"), Some(Ok(Adjustment::Add(dec!(150)))));
        assert_eq!(Adjustment::parse("-75.5"), Some(Ok(Adjustment::Subtract(dec!(75.5)))));
        assert_eq!(Adjustment::parse("000000"), Some(Ok(Adjustment::Replace(dec!(0)))));
    }

    #[test]
    fn test_adjustment_parse_rejects_garbage() {
        assert_eq!(Adjustment::parse("abc"), Some(Err("abc".to_string())));
        assert_eq!(Adjustment::parse("+"), Some(Err("+".to_string())));
        assert_eq!(Adjustment::parse("+-5"), Some(Err("+-5".to_string())));
    }

    #[test]
    fn test_adjustment_apply() {
        assert_eq!(Adjustment::Add(dec!(5)).apply(dec!(10)), dec!(15));
        assert_eq!(Adjustment::Subtract(dec!(15)).apply(dec!(10)), dec!(-5));
        assert_eq!(Adjustment::Replace(dec!(3)).apply(dec!(10)), dec!(3));
    }

    #[test]
    fn test_adjustment_apply_saturates_instead_of_overflowing() {
        assert_eq!(Adjustment::Add(Decimal::MAX).apply(Decimal::MAX), Decimal::MAX);
        assert_eq!(Adjustment::Subtract(Decimal::MAX).apply(Decimal::MIN), Decimal::MIN);

        let mut base = ScenarioInput::new(2025, FilingStatusCode::Single);
        base.income_other = Decimal::MAX;
        let scenario = WhatIfScenario {
            description: "Huge bonus".to_string(),
            adjustments: vec![(ScenarioField::IncomeOther, Adjustment::Add(Decimal::MAX))],
        };

        assert!(scenario.apply(&base).validate().is_err());
    }

    // =========================================================================
    // ScenarioLoader tests
    // =========================================================================

    #[test]
    fn test_parse_scenarios() {
        let scenarios = ScenarioLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(scenarios.len(), 3);
        assert_eq!(scenarios[0].description, "Base case");
        assert_eq!(scenarios[1].adjustments.len(), 2);
        assert_eq!(
            scenarios[2].adjustments,
            vec![
                (ScenarioField::IncomeOther, Adjustment::Add(dec!(100000))),
                (ScenarioField::CgShortTerm, Adjustment::Subtract(dec!(5000))),
            ]
        );
    }

    #[test]
    fn test_apply_leaves_base_untouched() {
        let scenarios = ScenarioLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
        let base = base();

        let blend = scenarios[2].apply(&base);

        assert_eq!(blend.income_other, dec!(120000));
        assert_eq!(blend.cg_short_term, dec!(5000));
        assert_eq!(blend.cg_long_term, dec!(40000));
        assert_eq!(base.income_other, dec!(20000));
    }

    #[test]
    fn test_base_case_reproduces_base() {
        let scenarios = ScenarioLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
        let mut base = base();
        base.cg_long_term = dec!(0);

        assert_eq!(scenarios[0].apply(&base), base);
    }

    #[test]
    fn test_description_column_is_case_insensitive() {
        let csv = "Description,income_wages\nRaise,+5000\n";

        let scenarios = ScenarioLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(scenarios[0].description, "Raise");
    }

    #[test]
    fn test_missing_description_column() {
        let err = ScenarioLoader::parse("income_wages\n+5000\n".as_bytes()).unwrap_err();

        assert!(matches!(err, ScenarioFileError::MissingDescription));
    }

    #[test]
    fn test_unknown_column() {
        let err = ScenarioLoader::parse("description,lottery\nWin,+1\n".as_bytes()).unwrap_err();

        assert!(matches!(err, ScenarioFileError::UnknownColumn(ref c) if c == "lottery"));
    }

    #[test]
    fn test_invalid_adjustment_reports_row_and_column() {
        let csv = "description,income_wages\nok,+1\nbad,ten\n";

        let err = ScenarioLoader::parse(csv.as_bytes()).unwrap_err();

        match err {
            ScenarioFileError::InvalidAdjustment { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "income_wages");
                assert_eq!(value, "ten");
            }
            other => panic!("expected InvalidAdjustment, got {other:?}"),
        }
    }
}
