//! # DeckHaus
//!
//! Persistence infrastructure for a flashcard study backend: a document store
//! abstraction, generic repositories, TTL caches over either the document store
//! or PostgreSQL, a periodic cache sweep, and migration/seed bookkeeping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckhaus::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! pub struct Deck {
//!     pub id: String,
//!     pub name: String,
//!     pub created_at: String,
//!     pub updated_at: String,
//! }
//!
//! impl Entity for Deck {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryDocumentStore::new());
//!     let deckhaus = DeckHaus::with_document_store(AppConfig::default(), store)?;
//!
//!     let decks = deckhaus.repository::<Deck>("decks")?;
//!     let deck = decks.create(&serde_json::json!({ "name": "Spanish verbs" })).await?;
//!
//!     let cache = deckhaus.cache("deck_stats")?;
//!     let due: u32 = cache
//!         .remember(&format!("due:{}", deck.id), || async { Ok::<_, anyhow::Error>(12) }, Some(300))
//!         .await?;
//!     println!("{} has {} cards due", deck.name, due);
//!
//!     let _cleanup = deckhaus.start_cache_cleanup();
//!     Ok(())
//! }
//! ```

pub mod cleanup;
pub mod core;
pub mod errors;
pub mod migration;
pub mod prelude;
pub mod registry;

// Re-export the main public types for convenience
pub use cleanup::{CleanupJobHandle, setup_cache_cleanup_job};
pub use core::DeckHaus;
pub use errors::DeckHausError;
pub use migration::{Migration, MigrationManager, MigrationRecord, Seed, SeedRecord};
pub use registry::{CacheBackend, CacheRegistry};

// Re-export centralized config
pub use config::{AppConfig, CacheBackendKind, CacheConfig, CleanupConfig, DatabaseConfig};

// Re-export the conditional logging macros
pub use document_store::{debug_log, trace_log};

// Re-export internal crates used by the public API
pub use cache_system;
pub use document_store;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
