//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! during cache operations against either backend.

use document_store::{StoreError, ValidationError};
use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Value producer failed: {0}")]
    Producer(#[source] anyhow::Error),

    #[error("Invalid TTL value: {0}")]
    InvalidTtl(u64),

    #[error("Invalid cache collection: {0}")]
    InvalidCollection(#[from] ValidationError),
}
