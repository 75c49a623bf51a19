//! Time-limited caching for deckhaus
//!
//! Values are stored as JSON alongside their expiry and read back lazily:
//! an expired entry is reported as a miss and evicted in the background.
//! Two backends are provided, one over a [`document_store::DocumentStore`]
//! collection and one over a PostgreSQL table.

pub mod document_backend;
pub mod entry;
pub mod errors;
pub mod postgres_backend;
pub mod prelude;
pub mod service;

// Re-export centralized config
pub use config::CacheConfig;

pub use document_backend::DocumentCacheService;
pub use entry::{CacheEntry, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS};
pub use errors::CacheError;
pub use postgres_backend::PgCacheService;
pub use service::{CacheService, CacheServiceExt};
