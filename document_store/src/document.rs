//! Documents and references
//!
//! A document is a JSON object. Its identifier lives in the [`DocumentRef`]
//! (and, by convention of the repository layer, also in an `id` field).

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw document payload
pub type Document = Map<String, Value>;

/// Address of a single document: collection name plus document id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Check that both path segments are usable
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.collection.is_empty() || self.id.is_empty() {
            return Err(StoreError::InvalidReference(format!(
                "empty path segment in '{}'",
                self
            )));
        }
        if self.collection.contains('/') || self.id.contains('/') {
            return Err(StoreError::InvalidReference(format!(
                "'/' is not allowed in a path segment: '{}'",
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document read back from a query
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Document,
}

impl DocumentSnapshot {
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Consume the snapshot and return its payload as a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

/// Turn any serializable value into a document, rejecting non-objects
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
