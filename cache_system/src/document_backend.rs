//! Cache backend over a document store
//!
//! Entries are documents in a single collection, looked up by an equality
//! query on `key`. Bulk deletions are split into write batches no larger than
//! the configured batch size.

use crate::entry::{CacheEntry, DEFAULT_TTL_SECONDS};
use crate::errors::CacheError;
use crate::service::CacheService;
use async_trait::async_trait;
use config::CacheConfig;
use document_store::document::to_document;
use document_store::{
    timestamp, CollectionName, CompareOperator, Document, DocumentQuery, DocumentRef,
    DocumentSnapshot, DocumentStore, StoreError, WriteBatch, MAX_BATCH_SIZE,
};
use serde_json::{Value, json};
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Clone)]
pub struct DocumentCacheService {
    store: Arc<dyn DocumentStore>,
    collection: CollectionName,
    default_ttl: u64,
    max_batch_size: usize,
}

impl Debug for DocumentCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCacheService")
            .field("collection", &self.collection.as_str())
            .field("default_ttl", &self.default_ttl)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}

impl DocumentCacheService {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str) -> Result<Self, CacheError> {
        Ok(Self {
            store,
            collection: CollectionName::new(collection)?,
            default_ttl: DEFAULT_TTL_SECONDS,
            max_batch_size: MAX_BATCH_SIZE,
        })
    }

    /// Build a service for `collection` using the TTL and batch settings from `config`
    pub fn from_config(
        store: Arc<dyn DocumentStore>,
        collection: &str,
        config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        Ok(Self::new(store, collection)?
            .with_default_ttl(config.default_ttl_seconds)
            .with_max_batch_size(config.max_batch_size))
    }

    pub fn with_default_ttl(mut self, ttl_seconds: u64) -> Self {
        self.default_ttl = ttl_seconds;
        self
    }

    /// Set the bulk-delete batch size, clamped to `1..=MAX_BATCH_SIZE`
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn find_snapshots(&self, key: &str, limit: Option<usize>) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let mut query = DocumentQuery::new().where_eq("key", key);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.store.query(self.collection.as_str(), &query).await
    }

    /// Delete documents by id in batches, returning the number removed
    async fn delete_in_batches(&self, ids: Vec<String>) -> Result<u64, StoreError> {
        let mut deleted = 0u64;
        for chunk in ids.chunks(self.max_batch_size) {
            let mut batch = WriteBatch::new();
            for id in chunk {
                batch.delete(DocumentRef::new(self.collection.as_str(), id.as_str()));
            }
            self.store.commit(batch).await?;
            deleted += chunk.len() as u64;
            document_store::debug_log!(
                "deleted batch of {} cache entries from {}",
                chunk.len(),
                self.collection
            );
        }
        Ok(deleted)
    }

    async fn write_entry(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<(), CacheError> {
        let now = timestamp::now();
        let expires_at = CacheEntry::expiry_for(now, ttl_seconds)?;

        match self.find_snapshots(key, Some(1)).await?.into_iter().next() {
            Some(existing) => {
                let mut patch = Document::new();
                patch.insert("value".to_string(), value);
                patch.insert("ttl".to_string(), json!(ttl_seconds));
                patch.insert("expiresAt".to_string(), timestamp::to_value(&expires_at));
                patch.insert("updatedAt".to_string(), timestamp::to_value(&now));
                self.store
                    .update(self.collection.as_str(), &existing.id, patch)
                    .await?;
            }
            None => {
                let entry = CacheEntry {
                    id: self.store.generate_id(),
                    key: key.to_string(),
                    value,
                    ttl: ttl_seconds,
                    expires_at,
                    created_at: now,
                    updated_at: now,
                };
                self.store
                    .set(self.collection.as_str(), &entry.id, to_document(&entry)?)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CacheService for DocumentCacheService {
    fn collection_name(&self) -> &str {
        self.collection.as_str()
    }

    fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    async fn find_entry(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let Some(snapshot) = self.find_snapshots(key, Some(1)).await?.into_iter().next() else {
            return Ok(None);
        };

        let mut data = snapshot.data;
        data.insert("id".to_string(), Value::String(snapshot.id));
        let entry: CacheEntry = serde_json::from_value(Value::Object(data))?;
        Ok(Some(entry))
    }

    fn evict_detached(&self, entry: CacheEntry) {
        let store = Arc::clone(&self.store);
        let collection = self.collection.clone();

        tokio::spawn(async move {
            // Only delete if no writer refreshed the entry in the meantime
            let still_expired = match store.get(collection.as_str(), &entry.id).await {
                Ok(Some(current)) => current
                    .get("expiresAt")
                    .and_then(Value::as_str)
                    .and_then(timestamp::parse)
                    .is_none_or(|expires_at| expires_at < timestamp::now()),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(
                        collection = collection.as_str(),
                        key = entry.key.as_str(),
                        error = %e,
                        "failed to re-read expired cache entry"
                    );
                    return;
                }
            };

            if still_expired {
                if let Err(e) = store.delete(collection.as_str(), &entry.id).await {
                    tracing::warn!(
                        collection = collection.as_str(),
                        key = entry.key.as_str(),
                        error = %e,
                        "failed to delete expired cache entry"
                    );
                }
            }
        });
    }

    async fn set_value(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<(), CacheError> {
        self.write_entry(key, value, ttl_seconds).await.map_err(|e| {
            tracing::error!(
                collection = self.collection.as_str(),
                key,
                error = %e,
                "cache set failed"
            );
            e
        })
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let result: Result<u64, StoreError> = async {
            let ids = self
                .find_snapshots(key, None)
                .await?
                .into_iter()
                .map(|snapshot| snapshot.id)
                .collect();
            self.delete_in_batches(ids).await
        }
        .await;

        result.map(|_| ()).map_err(|e| {
            tracing::error!(
                collection = self.collection.as_str(),
                key,
                error = %e,
                "cache delete failed"
            );
            e.into()
        })
    }

    async fn cleanup_expired(&self) -> Result<u64, CacheError> {
        let now = timestamp::now();
        let query = DocumentQuery::new().where_op(
            "expiresAt",
            CompareOperator::Lt,
            timestamp::to_value(&now),
        );

        let result: Result<u64, StoreError> = async {
            let ids = self
                .store
                .query(self.collection.as_str(), &query)
                .await?
                .into_iter()
                .map(|snapshot| snapshot.id)
                .collect();
            self.delete_in_batches(ids).await
        }
        .await;

        match result {
            Ok(removed) => {
                tracing::debug!(
                    collection = self.collection.as_str(),
                    removed,
                    "expired cache entries removed"
                );
                Ok(removed)
            }
            Err(e) => {
                tracing::error!(
                    collection = self.collection.as_str(),
                    error = %e,
                    "cache cleanup failed"
                );
                Err(e.into())
            }
        }
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        let result: Result<u64, StoreError> = async {
            let ids = self
                .store
                .query(self.collection.as_str(), &DocumentQuery::new())
                .await?
                .into_iter()
                .map(|snapshot| snapshot.id)
                .collect();
            self.delete_in_batches(ids).await
        }
        .await;

        result.map_err(|e| {
            tracing::error!(
                collection = self.collection.as_str(),
                error = %e,
                "cache clear failed"
            );
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CacheServiceExt;
    use chrono::TimeDelta;
    use document_store::MemoryDocumentStore;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct DeckStats {
        deck_id: String,
        due_cards: u32,
    }

    fn setup() -> (Arc<MemoryDocumentStore>, DocumentCacheService) {
        let store = Arc::new(MemoryDocumentStore::new());
        let cache = DocumentCacheService::new(store.clone(), "cache").unwrap();
        (store, cache)
    }

    /// Write an entry whose expiry is already `age` in the past
    async fn insert_stale(store: &MemoryDocumentStore, key: &str, age: TimeDelta) {
        let now = timestamp::now();
        let entry = CacheEntry {
            id: store.generate_id(),
            key: key.to_string(),
            value: json!("stale"),
            ttl: 1,
            expires_at: now - age,
            created_at: now - age - TimeDelta::seconds(1),
            updated_at: now - age - TimeDelta::seconds(1),
        };
        store
            .set("cache", &entry.id, to_document(&entry).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let (_, cache) = setup();
        let stats = DeckStats {
            deck_id: "d1".to_string(),
            due_cards: 12,
        };

        cache.set("stats:d1", &stats, Some(60)).await.unwrap();

        assert_eq!(cache.get::<DeckStats>("stats:d1").await, Some(stats));
        assert!(cache.has("stats:d1").await);
        assert_eq!(cache.get::<DeckStats>("stats:other").await, None);
        assert!(!cache.has("stats:other").await);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (store, cache) = setup();
        cache.set_value("session:7", json!({"cards": 3}), 1).await.unwrap();
        assert_eq!(cache.get_value("session:7").await, Some(json!({"cards": 3})));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.get_value("session:7").await, None);
        assert!(!cache.has("session:7").await);

        // The detached eviction removes the stale document
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.collection_len("cache").await, 0);
    }

    #[tokio::test]
    async fn test_public_reads_hide_what_the_backend_hook_returns() {
        let (store, cache) = setup();
        insert_stale(&store, "stats:d9", TimeDelta::minutes(5)).await;

        let raw = cache.find_entry("stats:d9").await.unwrap().unwrap();
        assert!(raw.is_expired());

        assert_eq!(cache.get_value("stats:d9").await, None);
        assert!(!cache.has("stats:d9").await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.find_entry("stats:d9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_entry() {
        let (store, cache) = setup();
        cache.set_value("k", json!("v1"), 60).await.unwrap();
        let first = cache.find_entry("k").await.unwrap().unwrap();

        cache.set_value("k", json!("v2"), 120).await.unwrap();
        let second = cache.find_entry("k").await.unwrap().unwrap();

        assert_eq!(store.collection_len("cache").await, 1);
        assert_eq!(cache.get_value("k").await, Some(json!("v2")));
        assert_eq!(second.id, first.id);
        assert_eq!(second.ttl, 120);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.expires_at > first.expires_at);
    }

    #[tokio::test]
    async fn test_delete_is_noop_for_missing_key() {
        let (store, cache) = setup();
        cache.set_value("k", json!(1), 60).await.unwrap();

        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("never-set").await.unwrap();

        assert!(!cache.has("k").await);
        assert_eq!(store.collection_len("cache").await, 0);
    }

    #[tokio::test]
    async fn test_remember_runs_producer_once() {
        let (_, cache) = setup();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..2 {
            let value: u32 = cache
                .remember(
                    "expensive",
                    move || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, anyhow::Error>(42)
                    },
                    Some(60),
                )
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remember_concurrent_callers_may_both_compute() {
        let (store, cache) = setup();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let producer = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, anyhow::Error>("computed".to_string())
        };

        let (a, b) = tokio::join!(
            cache.remember("race", producer, Some(60)),
            cache.remember("race", producer, Some(60)),
        );

        assert_eq!(a.unwrap(), "computed");
        assert_eq!(b.unwrap(), "computed");
        // Nothing serializes the two callers
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.collection_len("cache").await, 1);
    }

    #[tokio::test]
    async fn test_remember_propagates_producer_error() {
        let (_, cache) = setup();
        let result: Result<u32, CacheError> = cache
            .remember(
                "broken",
                || async { Err(anyhow::anyhow!("upstream timed out")) },
                None,
            )
            .await;

        assert!(matches!(result, Err(CacheError::Producer(_))));
        assert!(!cache.has("broken").await);
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_miss() {
        let (_, cache) = setup();
        cache.set_value("stats", json!("not a struct"), 60).await.unwrap();

        assert_eq!(cache.get::<DeckStats>("stats").await, None);
        // The raw value is still there
        assert!(cache.has("stats").await);
    }

    #[tokio::test]
    async fn test_corrupted_document_is_a_miss() {
        let (store, cache) = setup();
        let mut corrupted = Document::new();
        corrupted.insert("key".to_string(), json!("broken"));
        corrupted.insert("value".to_string(), json!(1));
        store.set("cache", "bad-doc", corrupted).await.unwrap();

        assert_eq!(cache.get_value("broken").await, None);
        assert!(!cache.has("broken").await);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let (store, cache) = setup();
        for i in 0..7 {
            insert_stale(&store, &format!("old:{}", i), TimeDelta::minutes(5)).await;
        }
        for i in 0..4 {
            cache.set_value(&format!("fresh:{}", i), json!(i), 600).await.unwrap();
        }

        let removed = cache.cleanup_expired().await.unwrap();

        assert_eq!(removed, 7);
        assert_eq!(store.collection_len("cache").await, 4);
        for i in 0..4 {
            assert_eq!(cache.get_value(&format!("fresh:{}", i)).await, Some(json!(i)));
        }
    }

    #[tokio::test]
    async fn test_cleanup_respects_batch_size() {
        let store = Arc::new(MemoryDocumentStore::new());
        let cache = DocumentCacheService::new(store.clone(), "cache")
            .unwrap()
            .with_max_batch_size(3);
        for i in 0..7 {
            insert_stale(&store, &format!("old:{}", i), TimeDelta::seconds(30)).await;
        }

        assert_eq!(cache.cleanup_expired().await.unwrap(), 7);
        assert_eq!(store.commit_count(), 3);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let (store, cache) = setup();
        assert_eq!(cache.clear().await.unwrap(), 0);

        insert_stale(&store, "old", TimeDelta::seconds(10)).await;
        cache.set_value("a", json!(1), 60).await.unwrap();
        cache.set_value("b", json!(2), 60).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 3);
        assert_eq!(store.collection_len("cache").await, 0);
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_read_errors_degrade_to_miss() {
        let (store, cache) = setup();
        cache.set_value("k", json!(1), 60).await.unwrap();
        store.set_unavailable(true);

        assert_eq!(cache.get_value("k").await, None);
        assert!(!cache.has("k").await);
    }

    #[tokio::test]
    async fn test_write_errors_propagate() {
        let (store, cache) = setup();
        store.set_unavailable(true);

        assert!(matches!(
            cache.set_value("k", json!(1), 60).await,
            Err(CacheError::Store(StoreError::Unavailable(_)))
        ));
        assert!(cache.delete("k").await.is_err());
        assert!(cache.cleanup_expired().await.is_err());
        assert!(cache.clear().await.is_err());
    }

    #[tokio::test]
    async fn test_default_ttl_from_config() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut config = CacheConfig::default();
        config.default_ttl_seconds = 90;
        config.max_batch_size = 100;

        let cache = DocumentCacheService::from_config(store, "deck_cache", &config).unwrap();
        cache.set("k", &"v", None).await.unwrap();

        let entry = cache.find_entry("k").await.unwrap().unwrap();
        assert_eq!(entry.ttl, 90);
        assert_eq!(cache.max_batch_size(), 100);
        assert_eq!(cache.collection_name(), "deck_cache");
    }

    #[test]
    fn test_invalid_collection_rejected() {
        let store = Arc::new(MemoryDocumentStore::new());
        assert!(matches!(
            DocumentCacheService::new(store, "bad-name"),
            Err(CacheError::InvalidCollection(_))
        ));
    }
}
