use crate::errors::RepositoryError;
use crate::traits::Entity;
use document_store::{
    timestamp, CollectionName, Document, DocumentRef, DocumentSnapshot, DocumentStore,
    MAX_BATCH_SIZE,
};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) const CREATED_AT: &str = "createdAt";
pub(crate) const UPDATED_AT: &str = "updatedAt";

/// Repository over one collection of a document store
pub struct GenericRepository<T: Entity> {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) collection: CollectionName,
    pub(crate) max_batch_size: usize,
    pub(crate) _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for GenericRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            max_batch_size: self.max_batch_size,
            _phantom: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for GenericRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericRepository")
            .field("collection", &self.collection.as_str())
            .field("entity", &std::any::type_name::<T>())
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}

impl<T: Entity> GenericRepository<T> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str) -> Result<Self, RepositoryError> {
        Ok(Self {
            store,
            collection: CollectionName::new(collection)?,
            max_batch_size: MAX_BATCH_SIZE,
            _phantom: PhantomData,
        })
    }

    /// Set the chunk size used by `execute_batch`, clamped to `1..=MAX_BATCH_SIZE`
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn document_ref(&self, id: &str) -> DocumentRef {
        DocumentRef::new(self.collection.as_str(), id)
    }

    /// Reference to a fresh, not yet written document
    pub fn new_document_ref(&self) -> DocumentRef {
        self.document_ref(&self.store.generate_id())
    }

    /// Check for a document without decoding it
    pub async fn document_exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.store.exists(self.collection.as_str(), id).await?)
    }

    /// Serialize a caller payload, which must be a JSON object
    pub(crate) fn payload_document<P>(payload: &P) -> Result<Document, RepositoryError>
    where
        P: Serialize + ?Sized,
    {
        match serde_json::to_value(payload)? {
            Value::Object(map) => Ok(map),
            other => Err(RepositoryError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                match other {
                    Value::Null => "null",
                    Value::Bool(_) => "a boolean",
                    Value::Number(_) => "a number",
                    Value::String(_) => "a string",
                    Value::Array(_) => "an array",
                    Value::Object(_) => "an object",
                }
            ))),
        }
    }

    /// Stamp `updatedAt` (and `createdAt` when `created` is set) with the current time
    pub(crate) fn stamp(document: &mut Document, created: bool) {
        let now = timestamp::to_value(&timestamp::now());
        if created {
            document.insert(CREATED_AT.to_string(), now.clone());
        }
        document.insert(UPDATED_AT.to_string(), now);
    }

    pub(crate) fn decode(id: &str, mut data: Document) -> Result<T, RepositoryError> {
        data.insert("id".to_string(), Value::String(id.to_string()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }

    pub(crate) fn decode_snapshot(snapshot: DocumentSnapshot) -> Result<T, RepositoryError> {
        Self::decode(&snapshot.id, snapshot.data)
    }

    /// Log a failed write and hand the error back
    pub(crate) fn log_failure(&self, operation: &str, id: &str, error: RepositoryError) -> RepositoryError {
        tracing::error!(
            collection = self.collection.as_str(),
            operation,
            id,
            error = %error,
            "repository write failed"
        );
        error
    }
}
