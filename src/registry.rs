//! Per-collection cache service registry
//!
//! The registry hands out one shared [`CacheService`] per collection name and
//! remembers every service it created so the cleanup job can sweep them all.

use crate::errors::DeckHausError;
use cache_system::{CacheConfig, CacheService, DocumentCacheService, PgCacheService};
use document_store::{CollectionName, DocumentStore};
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage used by the services a registry creates
#[derive(Clone)]
pub enum CacheBackend {
    Document(Arc<dyn DocumentStore>),
    Postgres(PgPool),
}

impl Debug for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Document(store) => f.debug_tuple("Document").field(store).finish(),
            CacheBackend::Postgres(_) => f.write_str("Postgres"),
        }
    }
}

#[derive(Debug)]
pub struct CacheRegistry {
    backend: CacheBackend,
    config: CacheConfig,
    services: Mutex<HashMap<String, Arc<dyn CacheService>>>,
}

impl CacheRegistry {
    pub fn new(backend: CacheBackend, config: CacheConfig) -> Self {
        Self {
            backend,
            config,
            services: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn services(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn CacheService>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.services
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Service for `collection`, created on first request and shared afterwards
    pub fn get_cache_service(&self, collection: &str) -> Result<Arc<dyn CacheService>, DeckHausError> {
        let name = CollectionName::new(collection)?;

        let mut services = self.services();
        if let Some(existing) = services.get(name.as_str()) {
            return Ok(Arc::clone(existing));
        }

        let service: Arc<dyn CacheService> = match &self.backend {
            CacheBackend::Document(store) => Arc::new(DocumentCacheService::from_config(
                Arc::clone(store),
                name.as_str(),
                &self.config,
            )?),
            CacheBackend::Postgres(pool) => Arc::new(PgCacheService::from_config(
                pool.clone(),
                name.as_str(),
                &self.config,
            )?),
        };

        tracing::debug!(collection = name.as_str(), "cache service created");
        services.insert(name.into_string(), Arc::clone(&service));
        Ok(service)
    }

    /// Install a custom service under its own collection name, replacing any
    /// service created for that name earlier
    pub fn register_service(&self, service: Arc<dyn CacheService>) -> Result<(), DeckHausError> {
        let name = CollectionName::new(service.collection_name())?;
        tracing::debug!(collection = name.as_str(), "cache service registered");
        self.services().insert(name.into_string(), service);
        Ok(())
    }

    /// Service for the configured default collection
    pub fn default_cache_service(&self) -> Result<Arc<dyn CacheService>, DeckHausError> {
        self.get_cache_service(&self.config.collection)
    }

    /// Names of every collection with a live service
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run `cleanup_expired` on every registered service.
    ///
    /// A failing collection is logged and skipped. Returns the total removed.
    pub async fn run_cleanup_pass(&self) -> u64 {
        let services: Vec<Arc<dyn CacheService>> = self.services().values().cloned().collect();

        let mut total = 0u64;
        for service in services {
            match service.cleanup_expired().await {
                Ok(removed) => total += removed,
                Err(e) => tracing::error!(
                    collection = service.collection_name(),
                    error = %e,
                    "cache cleanup failed for collection"
                ),
            }
        }

        tracing::info!(removed = total, "cache cleanup pass finished");
        total
    }
}
