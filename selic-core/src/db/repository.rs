use async_trait::async_trait;
use thiserror::Error;

use crate::models::{HistoryRecord, NewHistoryRecord};

/// Identity the store assigns to an appended record.
pub type RecordId = i64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Append-only log of saved simulations.
///
/// Records are never updated or deleted through this trait.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Stores `record` and returns the id assigned to it.
    async fn append(
        &self,
        record: NewHistoryRecord,
    ) -> Result<RecordId, RepositoryError>;

    async fn get(
        &self,
        id: RecordId,
    ) -> Result<HistoryRecord, RepositoryError>;

    /// Every committed record, oldest first.
    async fn list_all(&self) -> Result<Vec<HistoryRecord>, RepositoryError>;

    /// Releases the underlying connections. The repository must not be used
    /// afterwards.
    async fn close(&self) {}
}
