pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{ProjectionEngine, ProjectionError, project, project_scenarios};
pub use db::repository::{HistoryRepository, RecordId, RepositoryError};
pub use models::*;
