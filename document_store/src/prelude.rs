//! Convenience re-exports for common document-store usage

pub use crate::batch::{WriteBatch, WriteOperation, MAX_BATCH_SIZE};
pub use crate::document::{to_document, Document, DocumentRef, DocumentSnapshot};
pub use crate::errors::StoreError;
pub use crate::memory::MemoryDocumentStore;
pub use crate::query::{CompareOperator, DocumentQuery, FieldFilter, SortOrder};
pub use crate::store::DocumentStore;
pub use crate::validation::{CollectionName, ValidationError};

pub use async_trait::async_trait;
pub use serde_json::{json, Value};
