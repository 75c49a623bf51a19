//! Trait definitions
//!
//! This module defines the operations every entity repository provides.

use crate::batch::BatchOperation;
use crate::errors::RepositoryError;
use crate::find_options::{Filters, FindOptions};
use crate::traits::Entity;
use async_trait::async_trait;
use serde::Serialize;

/// CRUD, listing and batched writes over one collection
#[async_trait]
pub trait Repository: Send + Sync {
    /// The entity type stored by this repository
    type Model: Entity;

    /// Insert a new entity built from `data`, assigning its id and timestamps
    async fn create<P>(&self, data: &P) -> Result<Self::Model, RepositoryError>
    where
        P: Serialize + Sync + ?Sized;

    /// Get an entity by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Model>, RepositoryError>;

    /// List entities with filtering, ordering and offset pagination
    async fn find_all(&self, options: &FindOptions) -> Result<Vec<Self::Model>, RepositoryError>;

    /// Merge the non-null fields of `patch` into an existing entity
    async fn update<P>(&self, id: &str, patch: &P) -> Result<Self::Model, RepositoryError>
    where
        P: Serialize + Sync + ?Sized;

    /// Delete an entity by its ID, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Count entities matching every filter
    async fn count(&self, filters: &Filters) -> Result<u64, RepositoryError>;

    /// Apply write operations in atomic chunks
    async fn execute_batch(&self, operations: Vec<BatchOperation>) -> Result<(), RepositoryError>;
}
