pub mod repository;

pub use repository::{CarryforwardRepository, RepositoryError, load_or_default};
