use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tax_core::{CarryforwardRepository, CarryforwardState, RepositoryError};
use tracing::debug;

use crate::inputs::{parse_carryforward, render_carryforward};

/// Carryforward records stored as `<dir>/<year>_carryforward.dat`.
#[derive(Debug, Clone)]
pub struct FileCarryforwardRepository {
    dir: PathBuf,
}

impl FileCarryforwardRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, tax_year: i32) -> PathBuf {
        self.dir.join(format!("{tax_year}_carryforward.dat"))
    }
}

#[async_trait]
impl CarryforwardRepository for FileCarryforwardRepository {
    async fn load(&self, tax_year: i32) -> Result<CarryforwardState, RepositoryError> {
        let path = self.path_for(tax_year);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(tax_year));
            }
            Err(e) => {
                return Err(RepositoryError::Storage(format!(
                    "{}: {e}",
                    path.display()
                )));
            }
        };

        let state = parse_carryforward(&text)
            .map_err(|e| RepositoryError::Format(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), ?state, "loaded carryforward");
        Ok(state)
    }

    async fn save(
        &self,
        tax_year: i32,
        state: &CarryforwardState,
    ) -> Result<(), RepositoryError> {
        let path = self.path_for(tax_year);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepositoryError::Storage(format!("{}: {e}", self.dir.display())))?;
        tokio::fs::write(&path, render_carryforward(state))
            .await
            .map_err(|e| RepositoryError::Storage(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "saved carryforward");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::db::load_or_default;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tax-data-carryforward-{}-{name}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_path_for_year() {
        let repo = FileCarryforwardRepository::new("data");

        assert_eq!(repo.path_for(2025), PathBuf::from("data/2025_carryforward.dat"));
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let repo = FileCarryforwardRepository::new(scratch_dir("missing"));

        let err = repo.load(2025).await.unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(2025)));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = scratch_dir("save");
        let repo = FileCarryforwardRepository::new(&dir);
        let state = CarryforwardState {
            ma_capital_loss: dec!(4000),
            us_investment_interest: dec!(0),
            us_short_term_loss: dec!(812.25),
            us_long_term_loss: dec!(2187.75),
        };

        repo.save(2026, &state).await.unwrap();
        let loaded = repo.load(2026).await.unwrap();

        assert_eq!(loaded, state);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_load_or_default_initialises_missing_year() {
        let dir = scratch_dir("default");
        let repo = FileCarryforwardRepository::new(&dir);

        let (state, created) = load_or_default(&repo, 2025).await.unwrap();

        assert!(created);
        assert!(state.is_zero());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_malformed_record_is_format_error() {
        let dir = scratch_dir("malformed");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("2025_carryforward.dat"),
            "ma_capital_loss_carryforward=x\n",
        )
        .unwrap();
        let repo = FileCarryforwardRepository::new(&dir);

        let err = repo.load(2025).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Format(_)));
        let _ = std::fs::remove_dir_all(dir);
    }
}
