//! Atomic write batches
//!
//! A batch groups up to [`MAX_BATCH_SIZE`] writes that a store commits
//! all-or-nothing.

use crate::document::{Document, DocumentRef};
use crate::errors::StoreError;

/// Maximum number of operations a single batch may carry
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Create or replace the whole document
    Set { reference: DocumentRef, data: Document },
    /// Merge fields into an existing document
    Update { reference: DocumentRef, data: Document },
    Delete { reference: DocumentRef },
}

impl WriteOperation {
    pub fn reference(&self) -> &DocumentRef {
        match self {
            WriteOperation::Set { reference, .. }
            | WriteOperation::Update { reference, .. }
            | WriteOperation::Delete { reference } => reference,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    operations: Vec<WriteOperation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, reference: DocumentRef, data: Document) -> &mut Self {
        self.operations.push(WriteOperation::Set { reference, data });
        self
    }

    pub fn update(&mut self, reference: DocumentRef, data: Document) -> &mut Self {
        self.operations.push(WriteOperation::Update { reference, data });
        self
    }

    pub fn delete(&mut self, reference: DocumentRef) -> &mut Self {
        self.operations.push(WriteOperation::Delete { reference });
        self
    }

    pub fn push(&mut self, operation: WriteOperation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }

    /// Reject oversized batches and malformed references before anything is applied
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.operations.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge {
                size: self.operations.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        for operation in &self.operations {
            operation.reference().validate()?;
        }
        Ok(())
    }
}

impl From<Vec<WriteOperation>> for WriteBatch {
    fn from(operations: Vec<WriteOperation>) -> Self {
        Self { operations }
    }
}
