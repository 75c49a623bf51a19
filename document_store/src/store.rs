//! The document store contract

use crate::batch::WriteBatch;
use crate::document::{Document, DocumentSnapshot};
use crate::errors::StoreError;
use crate::query::{DocumentQuery, FieldFilter};
use async_trait::async_trait;
use std::fmt::Debug;

/// Operations every document store backend provides
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Allocate a fresh document id
    fn generate_id(&self) -> String;

    /// Read a single document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Check whether a document exists without returning it
    async fn exists(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        Ok(self.get(collection, id).await?.is_some())
    }

    /// Create or replace a document
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    /// Merge fields into an existing document, failing when it does not exist
    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<(), StoreError>;

    /// Remove a document; removing a missing document is not an error
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run a filtered, ordered, limited query
    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Server-side count of documents matching every filter
    async fn count(
        &self,
        collection: &str,
        filters: &[(String, FieldFilter)],
    ) -> Result<u64, StoreError>;

    /// Apply a batch atomically
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
