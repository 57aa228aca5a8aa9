use thiserror::Error;

use crate::models::FilingStatusCode;

/// Configuration and input failures raised by the calculation engines.
///
/// Every variant is fatal for the current computation; engines never return
/// a partial result alongside an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    /// The parameter tables hold no entry for the requested year.
    #[error("tax year {year} not supported; available: {available:?}")]
    UnsupportedTaxYear { year: i32, available: Vec<i32> },

    /// The year exists but has no parameters for the filing status.
    #[error("filing status '{status}' not defined for tax year {year} ({jurisdiction})")]
    InvalidFilingStatus {
        year: i32,
        status: FilingStatusCode,
        jurisdiction: &'static str,
    },

    /// A bracket schedule or rate violates the table invariants.
    #[error("malformed parameter data in {schedule}: {reason}")]
    MalformedParameterData { schedule: String, reason: String },

    /// A scenario field is missing or outside its domain.
    #[error("invalid scenario input '{field}': {reason}")]
    InvalidScenarioInput { field: String, reason: String },
}

impl TaxError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenarioInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
