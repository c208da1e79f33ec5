//! Error types shared by every Machine Flow crate.

use crate::id::Id;
use thiserror::Error;

/// Failures raised by a [`Storage`](crate::storage::Storage) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// Imported or loaded data does not have the expected shape.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),
    #[error("template name required")]
    EmptyTemplateName,
    #[error("template {0} not found")]
    TemplateNotFound(Id),
    #[error("node {0} not found")]
    NodeNotFound(Id),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
