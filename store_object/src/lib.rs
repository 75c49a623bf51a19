//! Store Object - generic repositories for deckhaus
//!
//! This crate provides a typed repository over one collection of a
//! [`document_store::DocumentStore`]: CRUD, filtered and paginated listing,
//! counting, and batched writes split into atomic chunks.

pub mod batch;
pub mod errors;
pub mod find_options;
pub mod generic_repository;
pub mod prelude;
pub mod traits;

pub use batch::{BatchOperation, BatchOperationKind};
pub use errors::RepositoryError;
pub use find_options::{Filters, FindOptions};
pub use generic_repository::GenericRepository;
pub use traits::*;
