//! Document store abstraction for deckhaus
//!
//! This crate defines the document-oriented storage contract used by the cache
//! and repository layers: collections of JSON documents addressed by string ids,
//! equality/comparison queries, and atomic write batches capped at
//! [`MAX_BATCH_SIZE`] operations. An in-process implementation is provided by
//! [`MemoryDocumentStore`].

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod batch;
pub mod document;
pub mod errors;
pub mod memory;
pub mod prelude;
pub mod query;
pub mod store;
pub mod timestamp;
pub mod validation;

pub use batch::{WriteBatch, WriteOperation, MAX_BATCH_SIZE};
pub use document::{Document, DocumentRef, DocumentSnapshot};
pub use errors::StoreError;
pub use memory::MemoryDocumentStore;
pub use query::{CompareOperator, DocumentQuery, FieldFilter, SortOrder};
pub use store::DocumentStore;
pub use validation::{CollectionName, ValidationError};
