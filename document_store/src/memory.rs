//! In-process document store
//!
//! Collections live in a `BTreeMap` per name behind a single async `RwLock`.
//! Batches are staged against an overlay and only applied once every
//! operation has succeeded, which gives them all-or-nothing semantics.

use crate::batch::{WriteBatch, WriteOperation};
use crate::document::{Document, DocumentSnapshot};
use crate::errors::StoreError;
use crate::query::{sort_values, DocumentQuery, FieldFilter, SortOrder};
use crate::store::DocumentStore;
use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

const GENERATED_ID_LENGTH: usize = 20;

type Collections = HashMap<String, BTreeMap<String, Document>>;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    commits: AtomicUsize,
    unavailable: AtomicBool,
}

impl std::fmt::Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collection_count = self
            .collections
            .try_read()
            .map(|collections| collections.len().to_string())
            .unwrap_or_else(|_| "locked".to_string());

        f.debug_struct("MemoryDocumentStore")
            .field("collections", &collection_count)
            .field("commits", &self.commit_count())
            .field("unavailable", &self.unavailable.load(AtomicOrdering::Relaxed))
            .finish()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(AtomicOrdering::SeqCst)
    }

    /// Simulate an unreachable store: every operation fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Number of documents currently held in a collection
    pub async fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory document store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn compare_documents(
        order_by: &[(String, SortOrder)],
        a: &DocumentSnapshot,
        b: &DocumentSnapshot,
    ) -> Ordering {
        for (field, order) in order_by {
            let ordering = sort_values(a.get(field), b.get(field));
            let ordering = match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id.cmp(&b.id)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn generate_id(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_ID_LENGTH)
            .map(char::from)
            .collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.ensure_available()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.ensure_available()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .is_some_and(|documents| documents.contains_key(id)))
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set(crate::DocumentRef::new(collection, id), data);
        self.apply(batch).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(crate::DocumentRef::new(collection, id), patch);
        self.apply(batch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(crate::DocumentRef::new(collection, id));
        self.apply(batch).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<DocumentSnapshot>, StoreError> {
        self.ensure_available()?;
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return match &query.start_after {
                Some(cursor) => Err(StoreError::not_found(collection, cursor)),
                None => Ok(Vec::new()),
            };
        };

        let mut matching: Vec<DocumentSnapshot> = documents
            .iter()
            .filter(|(_, data)| query.matches(data))
            .map(|(id, data)| DocumentSnapshot::new(id.clone(), data.clone()))
            .collect();

        matching.sort_by(|a, b| Self::compare_documents(&query.order_by, a, b));

        if let Some(cursor_id) = &query.start_after {
            let cursor_data = documents
                .get(cursor_id)
                .ok_or_else(|| StoreError::not_found(collection, cursor_id))?;
            let cursor = DocumentSnapshot::new(cursor_id.clone(), cursor_data.clone());
            matching.retain(|snapshot| {
                Self::compare_documents(&query.order_by, snapshot, &cursor) == Ordering::Greater
            });
        }

        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }

        crate::trace_log!("memory query on {} returned {} documents", collection, matching.len());
        Ok(matching)
    }

    async fn count(
        &self,
        collection: &str,
        filters: &[(String, FieldFilter)],
    ) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|data| {
                        filters
                            .iter()
                            .all(|(field, filter)| filter.matches(data.get(field)))
                    })
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.apply(batch).await?;
        self.commits.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

impl MemoryDocumentStore {
    async fn apply(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.ensure_available()?;
        batch.validate()?;

        let mut collections = self.collections.write().await;

        // (collection, id) -> final state; None marks a deletion
        let mut staged: HashMap<(String, String), Option<Document>> = HashMap::new();

        for operation in batch.into_operations() {
            match operation {
                WriteOperation::Set { reference, data } => {
                    staged.insert((reference.collection, reference.id), Some(data));
                }
                WriteOperation::Update { reference, data } => {
                    let key = (reference.collection, reference.id);
                    let current = match staged.get(&key) {
                        Some(staged_state) => staged_state.clone(),
                        None => collections
                            .get(&key.0)
                            .and_then(|documents| documents.get(&key.1))
                            .cloned(),
                    };
                    let mut merged =
                        current.ok_or_else(|| StoreError::not_found(&key.0, &key.1))?;
                    merged.extend(data);
                    staged.insert(key, Some(merged));
                }
                WriteOperation::Delete { reference } => {
                    staged.insert((reference.collection, reference.id), None);
                }
            }
        }

        for ((collection, id), state) in staged {
            match state {
                Some(data) => {
                    collections.entry(collection).or_default().insert(id, data);
                }
                None => {
                    if let Some(documents) = collections.get_mut(&collection) {
                        documents.remove(&id);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::to_document;
    use crate::query::CompareOperator;
    use crate::DocumentRef;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        to_document(&value).unwrap()
    }

    async fn seeded_store() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (id, deck, interval) in [("c1", "es", 1), ("c2", "es", 4), ("c3", "fr", 9), ("c4", "es", 16)] {
            store
                .set("cards", id, doc(json!({"deck": deck, "interval": interval})))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let store = MemoryDocumentStore::new();
        let a = store.generate_id();
        let b = store.generate_id();
        assert_eq!(a.len(), GENERATED_ID_LENGTH);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_set_get_update_delete() {
        let store = MemoryDocumentStore::new();
        store
            .set("decks", "d1", doc(json!({"title": "Verbs", "cards": 3})))
            .await
            .unwrap();

        store
            .update("decks", "d1", doc(json!({"cards": 4})))
            .await
            .unwrap();
        let stored = store.get("decks", "d1").await.unwrap().unwrap();
        assert_eq!(stored.get("title"), Some(&json!("Verbs")));
        assert_eq!(stored.get("cards"), Some(&json!(4)));

        store.delete("decks", "d1").await.unwrap();
        assert!(store.get("decks", "d1").await.unwrap().is_none());
        // Deleting twice is fine
        store.delete("decks", "d1").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let result = store.update("decks", "ghost", doc(json!({"x": 1}))).await;
        assert!(matches!(result, Err(StoreError::DocumentNotFound { .. })));
        assert_eq!(store.collection_len("decks").await, 0);
    }

    #[tokio::test]
    async fn test_query_filters_order_and_limit() {
        let store = seeded_store().await;

        let query = DocumentQuery::new()
            .where_eq("deck", "es")
            .where_op("interval", CompareOperator::Gt, 1)
            .order_by("interval", SortOrder::Desc);
        let ids: Vec<String> = store
            .query("cards", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["c4", "c2"]);

        let limited = store
            .query("cards", &DocumentQuery::new().order_by("interval", SortOrder::Asc).limit(2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, "c1");
    }

    #[tokio::test]
    async fn test_query_start_after_cursor() {
        let store = seeded_store().await;
        let query = DocumentQuery::new()
            .order_by("interval", SortOrder::Asc)
            .start_after("c2");
        let ids: Vec<String> = store
            .query("cards", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["c3", "c4"]);

        let missing_cursor = DocumentQuery::new().start_after("nope");
        assert!(store.query("cards", &missing_cursor).await.is_err());
    }

    #[tokio::test]
    async fn test_count_with_filters() {
        let store = seeded_store().await;
        let filters = vec![("deck".to_string(), FieldFilter::equals("es"))];
        assert_eq!(store.count("cards", &filters).await.unwrap(), 3);
        assert_eq!(store.count("cards", &[]).await.unwrap(), 4);
        assert_eq!(store.count("empty", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_is_atomic() {
        let store = seeded_store().await;

        let mut batch = WriteBatch::new();
        batch
            .delete(DocumentRef::new("cards", "c1"))
            .update(DocumentRef::new("cards", "missing"), doc(json!({"x": 1})));

        assert!(store.commit(batch).await.is_err());
        assert!(store.get("cards", "c1").await.unwrap().is_some());
        assert_eq!(store.commit_count(), 0);

        let mut batch = WriteBatch::new();
        batch
            .set(DocumentRef::new("cards", "c5"), doc(json!({"deck": "de"})))
            .update(DocumentRef::new("cards", "c5"), doc(json!({"interval": 2})))
            .delete(DocumentRef::new("cards", "c1"));
        store.commit(batch).await.unwrap();

        assert_eq!(store.commit_count(), 1);
        assert!(store.get("cards", "c1").await.unwrap().is_none());
        let c5 = store.get("cards", "c5").await.unwrap().unwrap();
        assert_eq!(c5.get("interval"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = seeded_store().await;
        store.set_unavailable(true);

        assert!(matches!(
            store.get("cards", "c1").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.query("cards", &DocumentQuery::new()).await.is_err());
        assert!(store.delete("cards", "c1").await.is_err());

        store.set_unavailable(false);
        assert!(store.get("cards", "c1").await.unwrap().is_some());
    }
}
