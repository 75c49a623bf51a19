//! Write operations accepted by `execute_batch`

use crate::errors::RepositoryError;
use document_store::{Document, DocumentRef, WriteOperation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperationKind {
    Create,
    Update,
    Delete,
}

/// A single write in a repository batch. Create and update carry data,
/// delete does not.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperation {
    pub kind: BatchOperationKind,
    pub reference: DocumentRef,
    pub data: Option<Document>,
}

impl BatchOperation {
    pub fn create(reference: DocumentRef, data: Document) -> Self {
        Self {
            kind: BatchOperationKind::Create,
            reference,
            data: Some(data),
        }
    }

    pub fn update(reference: DocumentRef, data: Document) -> Self {
        Self {
            kind: BatchOperationKind::Update,
            reference,
            data: Some(data),
        }
    }

    pub fn delete(reference: DocumentRef) -> Self {
        Self {
            kind: BatchOperationKind::Delete,
            reference,
            data: None,
        }
    }

    /// Convert into a store write, rejecting create/update without data
    pub fn into_write(self) -> Result<WriteOperation, RepositoryError> {
        let Self {
            kind,
            reference,
            data,
        } = self;

        match (kind, data) {
            (BatchOperationKind::Create, Some(data)) => Ok(WriteOperation::Set { reference, data }),
            (BatchOperationKind::Update, Some(data)) => {
                Ok(WriteOperation::Update { reference, data })
            }
            (BatchOperationKind::Delete, _) => Ok(WriteOperation::Delete { reference }),
            (kind, None) => Err(RepositoryError::InvalidDocument(format!(
                "{:?} operation on {} has no data",
                kind, reference
            ))),
        }
    }
}
