//! Core DeckHaus functionality
//!
//! This module contains the main DeckHaus struct and its implementation,
//! providing centralized coordination for the document store, repositories,
//! caching, cache cleanup and migrations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::cleanup::{CleanupJobHandle, setup_cache_cleanup_job};
use crate::errors::DeckHausError;
use crate::migration::MigrationManager;
use crate::registry::{CacheBackend, CacheRegistry};
use cache_system::CacheService;
use config::{AppConfig, CacheBackendKind, DatabaseConfig};
use document_store::DocumentStore;
use store_object::{Entity, GenericRepository};

/// Main DeckHaus coordinator that owns the stores and shared services
#[derive(Debug)]
pub struct DeckHaus {
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
    pool: Option<PgPool>,
    cache_registry: Arc<CacheRegistry>,
    migrations: MigrationManager,
}

impl DeckHaus {
    /// Create a coordinator from configuration.
    ///
    /// A PostgreSQL pool is opened only when the cache backend is `postgres`.
    pub async fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, DeckHausError> {
        config.validate()?;

        let pool = match config.cache.backend {
            CacheBackendKind::Postgres => Some(Self::connect(&config.database).await?),
            CacheBackendKind::Document => None,
        };

        Ok(Self::assemble(config, store, pool))
    }

    /// Create a coordinator without a relational pool; caches live in the document store
    pub fn with_document_store(
        mut config: AppConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, DeckHausError> {
        config.cache.backend = CacheBackendKind::Document;
        config.validate()?;
        Ok(Self::assemble(config, store, None))
    }

    async fn connect(config: &DatabaseConfig) -> Result<PgPool, DeckHausError> {
        let connection_string = config.connection_string();

        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let pool = pool_options.connect(&connection_string).await?;
        tracing::info!(
            host = config.host.as_str(),
            database = config.database.as_str(),
            "connected to PostgreSQL"
        );
        Ok(pool)
    }

    fn assemble(config: AppConfig, store: Arc<dyn DocumentStore>, pool: Option<PgPool>) -> Self {
        let backend = match &pool {
            Some(pool) => CacheBackend::Postgres(pool.clone()),
            None => CacheBackend::Document(Arc::clone(&store)),
        };
        let cache_registry = Arc::new(CacheRegistry::new(backend, config.cache.clone()));
        let migrations = MigrationManager::new(Arc::clone(&store));

        Self {
            config,
            store,
            pool,
            cache_registry,
            migrations,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn document_store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Database pool, present only with the `postgres` cache backend
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Repository for entities of type `T` stored in `collection`.
    ///
    /// Batches are chunked at the store limit; `cache.max_batch_size` only
    /// governs cache sweeps.
    pub fn repository<T: Entity>(&self, collection: &str) -> Result<GenericRepository<T>, DeckHausError> {
        Ok(GenericRepository::new(Arc::clone(&self.store), collection)?)
    }

    pub fn cache_registry(&self) -> &Arc<CacheRegistry> {
        &self.cache_registry
    }

    /// Shared cache service for `collection`
    pub fn cache(&self, collection: &str) -> Result<Arc<dyn CacheService>, DeckHausError> {
        self.cache_registry.get_cache_service(collection)
    }

    pub fn migrations(&self) -> &MigrationManager {
        &self.migrations
    }

    pub fn migrations_mut(&mut self) -> &mut MigrationManager {
        &mut self.migrations
    }

    /// Start the periodic cache sweep, unless disabled in configuration
    pub fn start_cache_cleanup(&self) -> Option<CleanupJobHandle> {
        if !self.config.cleanup.enabled {
            tracing::info!("cache cleanup job disabled");
            return None;
        }
        Some(setup_cache_cleanup_job(
            Arc::clone(&self.cache_registry),
            self.config.cleanup.interval(),
        ))
    }

    /// Check backing store health
    pub async fn health_check(&self) -> Result<(), DeckHausError> {
        match &self.pool {
            Some(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
            None => {
                self.store.count(&self.config.cache.collection, &[]).await?;
            }
        }
        Ok(())
    }
}
