use document_store::{StoreError, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Entity with ID {0} not found")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(#[from] ValidationError),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
