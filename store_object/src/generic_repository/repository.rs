//! Repository implementation for [`GenericRepository`]

use super::core::GenericRepository;
use crate::batch::BatchOperation;
use crate::errors::RepositoryError;
use crate::find_options::{Filters, FindOptions};
use crate::traits::{Entity, Repository};
use async_trait::async_trait;
use document_store::WriteBatch;
use futures::future::try_join_all;
use serde::Serialize;

#[async_trait]
impl<T: Entity> Repository for GenericRepository<T> {
    type Model = T;

    async fn create<P>(&self, data: &P) -> Result<T, RepositoryError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let id = self.store.generate_id();
        let result: Result<T, RepositoryError> = async {
            let mut document = Self::payload_document(data)?;
            document.remove("id");
            Self::stamp(&mut document, true);
            document.insert("id".to_string(), id.clone().into());

            self.store
                .set(self.collection.as_str(), &id, document.clone())
                .await?;
            Self::decode(&id, document)
        }
        .await;

        result.map_err(|e| self.log_failure("create", &id, e))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        match self.store.get(self.collection.as_str(), id).await? {
            Some(data) => Ok(Some(Self::decode(id, data)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self, options: &FindOptions) -> Result<Vec<T>, RepositoryError> {
        let collection = self.collection.as_str();
        let mut query = options.base_query().limit(options.limit);

        if options.offset > 0 {
            // Walk past the skipped rows to find the cursor document
            let skipped = self
                .store
                .query(collection, &options.base_query().limit(options.offset))
                .await?;
            let Some(cursor) = skipped.last().filter(|_| skipped.len() == options.offset) else {
                return Ok(Vec::new());
            };
            query = query.start_after(cursor.id.clone());
        }

        let snapshots = self.store.query(collection, &query).await?;
        document_store::debug_log!(
            "find_all on {} returned {} documents (offset {})",
            collection,
            snapshots.len(),
            options.offset
        );
        snapshots.into_iter().map(Self::decode_snapshot).collect()
    }

    async fn update<P>(&self, id: &str, patch: &P) -> Result<T, RepositoryError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let result: Result<T, RepositoryError> = async {
            let collection = self.collection.as_str();
            if !self.store.exists(collection, id).await? {
                return Err(RepositoryError::NotFound(id.to_string()));
            }

            let mut changes = Self::payload_document(patch)?;
            changes.retain(|field, value| !value.is_null() && field != "id");
            Self::stamp(&mut changes, false);

            self.store.update(collection, id, changes).await?;

            let data = self
                .store
                .get(collection, id)
                .await?
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
            Self::decode(id, data)
        }
        .await;

        result.map_err(|e| self.log_failure("update", id, e))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let result: Result<bool, RepositoryError> = async {
            let collection = self.collection.as_str();
            if !self.store.exists(collection, id).await? {
                return Ok(false);
            }
            self.store.delete(collection, id).await?;
            Ok(true)
        }
        .await;

        result.map_err(|e| self.log_failure("delete", id, e))
    }

    async fn count(&self, filters: &Filters) -> Result<u64, RepositoryError> {
        Ok(self
            .store
            .count(self.collection.as_str(), filters.as_slice())
            .await?)
    }

    async fn execute_batch(&self, operations: Vec<BatchOperation>) -> Result<(), RepositoryError> {
        let total = operations.len();
        let mut chunks: Vec<Vec<BatchOperation>> = Vec::new();
        let mut remaining = operations.into_iter().peekable();
        while remaining.peek().is_some() {
            chunks.push(remaining.by_ref().take(self.max_batch_size).collect());
        }

        let commits = chunks.into_iter().map(|chunk| async move {
            let mut batch = WriteBatch::new();
            for operation in chunk {
                batch.push(operation.into_write()?);
            }
            self.store.commit(batch).await?;
            Ok::<_, RepositoryError>(())
        });

        let committed = try_join_all(commits).await.map_err(|e| {
            tracing::error!(
                collection = self.collection.as_str(),
                operations = total,
                error = %e,
                "batch execution failed"
            );
            e
        })?;

        tracing::debug!(
            collection = self.collection.as_str(),
            operations = total,
            batches = committed.len(),
            "batch executed"
        );
        Ok(())
    }
}
