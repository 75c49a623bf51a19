//! Database migration and seed functionality
//!
//! Migrations and seeds are registered in-process and run at most once each.
//! Executed units are recorded in the `database_migrations` and
//! `database_seeds` collections of the document store, and the runner reads
//! those records before executing anything.

use crate::errors::DeckHausError;
use async_trait::async_trait;
use document_store::document::to_document;
use document_store::{DocumentQuery, DocumentSnapshot, DocumentStore, SortOrder, timestamp};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

pub const MIGRATIONS_COLLECTION: &str = "database_migrations";
pub const SEEDS_COLLECTION: &str = "database_seeds";

/// A schema or data change applied once, in ascending version order
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique name, used to detect whether the migration already ran
    fn name(&self) -> &str;

    fn version(&self) -> i64;

    async fn up(&self) -> anyhow::Result<()>;

    /// Whether [`Migration::down`] is implemented
    fn reversible(&self) -> bool {
        false
    }

    async fn down(&self) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("migration {} is not reversible", self.name()))
    }
}

/// Data loaded once, in ascending priority order
#[async_trait]
pub trait Seed: Send + Sync {
    fn name(&self) -> &str;

    /// Lower priorities run first
    fn priority(&self) -> i64;

    async fn run(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub id: String,
    pub name: String,
    pub version: i64,
    pub executed_at: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub id: String,
    pub name: String,
    pub priority: i64,
    pub executed_at: String,
    pub execution_time_ms: u64,
}

pub struct MigrationManager {
    store: Arc<dyn DocumentStore>,
    migrations: Vec<Arc<dyn Migration>>,
    seeds: Vec<Arc<dyn Seed>>,
}

impl Debug for MigrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationManager")
            .field(
                "migrations",
                &self.migrations.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("seeds", &self.seeds.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl MigrationManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            migrations: Vec::new(),
            seeds: Vec::new(),
        }
    }

    pub fn register_migration(&mut self, migration: Arc<dyn Migration>) {
        tracing::debug!(
            name = migration.name(),
            version = migration.version(),
            "migration registered"
        );
        self.migrations.push(migration);
    }

    pub fn register_seed(&mut self, seed: Arc<dyn Seed>) {
        tracing::debug!(name = seed.name(), priority = seed.priority(), "seed registered");
        self.seeds.push(seed);
    }

    async fn load_records<R: DeserializeOwned>(
        &self,
        collection: &str,
        order_field: &str,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<R>, DeckHausError> {
        let mut query = DocumentQuery::new().order_by(order_field, order);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let snapshots = self.store.query(collection, &query).await?;
        let records = snapshots
            .into_iter()
            .map(|DocumentSnapshot { id, mut data }| {
                data.insert("id".to_string(), id.into());
                serde_json::from_value(data.into())
            })
            .collect::<Result<Vec<R>, _>>()
            .map_err(document_store::StoreError::from)?;
        Ok(records)
    }

    async fn executed_names(&self, collection: &str) -> Result<HashSet<String>, DeckHausError> {
        let snapshots = self.store.query(collection, &DocumentQuery::new()).await?;
        Ok(snapshots
            .into_iter()
            .filter_map(|snapshot| {
                snapshot
                    .get("name")
                    .and_then(|name| name.as_str())
                    .map(str::to_string)
            })
            .collect())
    }

    /// Run every registered migration that has no record yet, in ascending
    /// version order. Returns how many ran. The first failure stops the run.
    pub async fn run_migrations(&self) -> Result<usize, DeckHausError> {
        tracing::info!("running pending migrations");
        let executed = self.executed_names(MIGRATIONS_COLLECTION).await?;

        let mut pending: Vec<&Arc<dyn Migration>> = self
            .migrations
            .iter()
            .filter(|migration| !executed.contains(migration.name()))
            .collect();
        pending.sort_by_key(|migration| migration.version());

        for migration in &pending {
            let name = migration.name();
            tracing::info!(name, version = migration.version(), "running migration");

            let started = Instant::now();
            migration.up().await.map_err(|source| {
                tracing::error!(name, error = %source, "migration failed");
                DeckHausError::MigrationFailed {
                    name: name.to_string(),
                    source,
                }
            })?;
            let execution_time_ms = started.elapsed().as_millis() as u64;

            let record = MigrationRecord {
                id: self.store.generate_id(),
                name: name.to_string(),
                version: migration.version(),
                executed_at: timestamp::format(&timestamp::now()),
                execution_time_ms,
            };
            self.store
                .set(MIGRATIONS_COLLECTION, &record.id, to_document(&record)?)
                .await?;

            tracing::info!(name, execution_time_ms, "migration complete");
        }

        tracing::info!(executed = pending.len(), "migrations up to date");
        Ok(pending.len())
    }

    /// Revert the `count` most recent migrations. Records whose migration is
    /// not registered or not reversible are skipped with a warning. Returns
    /// how many were reverted.
    pub async fn rollback_migrations(&self, count: usize) -> Result<usize, DeckHausError> {
        if count == 0 {
            return Ok(0);
        }

        tracing::info!(count, "rolling back migrations");
        let records: Vec<MigrationRecord> = self
            .load_records(MIGRATIONS_COLLECTION, "version", SortOrder::Desc, Some(count))
            .await?;

        let mut reverted = 0;
        for record in records {
            let Some(migration) = self.migrations.iter().find(|m| m.name() == record.name) else {
                tracing::warn!(name = record.name.as_str(), "executed migration is not registered, skipping");
                continue;
            };
            if !migration.reversible() {
                tracing::warn!(name = record.name.as_str(), "migration has no down step, skipping");
                continue;
            }

            migration.down().await.map_err(|source| {
                tracing::error!(name = record.name.as_str(), error = %source, "rollback failed");
                DeckHausError::RollbackFailed {
                    name: record.name.clone(),
                    source,
                }
            })?;
            self.store.delete(MIGRATIONS_COLLECTION, &record.id).await?;

            tracing::info!(name = record.name.as_str(), "migration rolled back");
            reverted += 1;
        }

        Ok(reverted)
    }

    /// Run every registered seed that has no record yet, in ascending
    /// priority order. Returns how many ran.
    pub async fn run_seeds(&self) -> Result<usize, DeckHausError> {
        tracing::info!("running pending seeds");
        let executed = self.executed_names(SEEDS_COLLECTION).await?;

        let mut pending: Vec<&Arc<dyn Seed>> = self
            .seeds
            .iter()
            .filter(|seed| !executed.contains(seed.name()))
            .collect();
        pending.sort_by_key(|seed| seed.priority());

        for seed in &pending {
            let name = seed.name();
            tracing::info!(name, priority = seed.priority(), "running seed");

            let started = Instant::now();
            seed.run().await.map_err(|source| {
                tracing::error!(name, error = %source, "seed failed");
                DeckHausError::SeedFailed {
                    name: name.to_string(),
                    source,
                }
            })?;
            let execution_time_ms = started.elapsed().as_millis() as u64;

            let record = SeedRecord {
                id: self.store.generate_id(),
                name: name.to_string(),
                priority: seed.priority(),
                executed_at: timestamp::format(&timestamp::now()),
                execution_time_ms,
            };
            self.store
                .set(SEEDS_COLLECTION, &record.id, to_document(&record)?)
                .await?;

            tracing::info!(name, execution_time_ms, "seed complete");
        }

        Ok(pending.len())
    }

    /// Recorded migrations in ascending version order
    pub async fn executed_migrations(&self) -> Result<Vec<MigrationRecord>, DeckHausError> {
        self.load_records(MIGRATIONS_COLLECTION, "version", SortOrder::Asc, None)
            .await
    }

    /// Recorded seeds in ascending priority order
    pub async fn executed_seeds(&self) -> Result<Vec<SeedRecord>, DeckHausError> {
        self.load_records(SEEDS_COLLECTION, "priority", SortOrder::Asc, None)
            .await
    }
}
