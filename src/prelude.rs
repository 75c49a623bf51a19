//! Convenience re-exports for common DeckHaus usage
//!
//! This prelude module re-exports the most commonly used items from the DeckHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use deckhaus::prelude::*;
//!
//! // Now you have access to all the common DeckHaus types and traits
//! ```

// Core DeckHaus components
pub use crate::cleanup::{CleanupJobHandle, setup_cache_cleanup_job};
pub use crate::core::DeckHaus;
pub use crate::errors::DeckHausError;
pub use crate::migration::{Migration, MigrationManager, Seed};
pub use crate::registry::{CacheBackend, CacheRegistry};

// Re-export centralized config
pub use config::{AppConfig, CacheBackendKind, CacheConfig, CleanupConfig, DatabaseConfig};

// Re-export document store types
pub use document_store::{Document, DocumentRef, DocumentStore, MemoryDocumentStore};

// Re-export commonly used repository types for convenience
pub use store_object::prelude::*;

// Re-export cache system
pub use cache_system::{CacheEntry, CacheError, CacheService, CacheServiceExt};

// Common external dependencies
pub use anyhow;
pub use serde_json;
pub use sqlx;
pub use tokio;

// Commonly used sqlx types
pub use sqlx::PgPool;
