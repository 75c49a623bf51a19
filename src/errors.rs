//! Error types for the DeckHaus crate
//!
//! This module contains all error types that can be returned by DeckHaus operations.

use cache_system::CacheError;
use config::ConfigError;
use document_store::{StoreError, ValidationError};
use store_object::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckHausError {
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(#[from] ValidationError),

    #[error("Migration {name} failed: {source}")]
    MigrationFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Seed {name} failed: {source}")]
    SeedFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Rollback of migration {name} failed: {source}")]
    RollbackFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
