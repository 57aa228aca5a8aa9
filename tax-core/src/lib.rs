pub mod calculations;
pub mod db;
pub mod error;
pub mod models;

pub use db::repository::{CarryforwardRepository, RepositoryError};
pub use error::TaxError;
pub use models::*;
