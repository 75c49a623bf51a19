//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::document_backend::DocumentCacheService;
pub use crate::entry::CacheEntry;
pub use crate::errors::CacheError;
pub use crate::postgres_backend::PgCacheService;
pub use crate::service::{CacheService, CacheServiceExt};

// Re-export centralized config
pub use config::CacheConfig;

// Common external dependencies
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;
