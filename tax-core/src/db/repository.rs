use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::models::CarryforwardState;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("No carryforward record for tax year {0}")]
    NotFound(i32),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed carryforward record: {0}")]
    Format(String),
}

/// Persistence for the per-year carryforward record.
///
/// The engines never touch this trait; callers load the prior record,
/// thread it through the scenario, and save what the engines produce.
#[async_trait]
pub trait CarryforwardRepository: Send + Sync {
    /// Record for `tax_year`, or [`RepositoryError::NotFound`].
    async fn load(&self, tax_year: i32) -> Result<CarryforwardState, RepositoryError>;

    /// Creates or replaces the record for `tax_year`.
    async fn save(
        &self,
        tax_year: i32,
        state: &CarryforwardState,
    ) -> Result<(), RepositoryError>;
}

/// Loads the record for `tax_year`, falling back to zero when none exists.
///
/// The flag is `true` when the record was missing, so the caller can
/// initialise it.
pub async fn load_or_default(
    repository: &dyn CarryforwardRepository,
    tax_year: i32,
) -> Result<(CarryforwardState, bool), RepositoryError> {
    match repository.load(tax_year).await {
        Ok(state) => Ok((state, false)),
        Err(RepositoryError::NotFound(_)) => {
            warn!(tax_year, "no carryforward record, using zero amounts");
            Ok((CarryforwardState::default(), true))
        }
        Err(e) => Err(e),
    }
}
