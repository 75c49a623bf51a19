//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{Entity, Repository};

// Error types
pub use crate::errors::RepositoryError;

// Core repository functionality
pub use crate::generic_repository::GenericRepository;

// Listing and batching
pub use crate::batch::{BatchOperation, BatchOperationKind};
pub use crate::find_options::{Filters, FindOptions};
pub use document_store::{CompareOperator, FieldFilter, SortOrder};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
