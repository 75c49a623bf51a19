//! Traits for repository operations
//!
//! This module contains the traits that define entities and the interface of
//! repositories over a document store.

pub mod entity;
pub mod repository;

// Re-export all public items for convenience
pub use entity::Entity;
pub use repository::Repository;
