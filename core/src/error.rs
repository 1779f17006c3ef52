use crate::schema::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl Error {
    /// Whether the error came from the storage substrate rather than the caller's input
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Io(_) | Error::StorageUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
