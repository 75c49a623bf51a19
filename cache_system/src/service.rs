//! The cache service contract
//!
//! [`CacheService`] is object safe and JSON-valued so that registries can hold
//! `Arc<dyn CacheService>` regardless of backend. Typed access and the
//! compute-or-fetch helper live in [`CacheServiceExt`], which every service
//! gets for free.

use crate::entry::{CacheEntry, DEFAULT_TTL_SECONDS};
use crate::errors::CacheError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;

#[async_trait]
pub trait CacheService: Send + Sync + Debug {
    /// Collection (or table) holding this service's entries
    fn collection_name(&self) -> &str;

    /// TTL applied when callers do not pass one
    fn default_ttl(&self) -> u64 {
        DEFAULT_TTL_SECONDS
    }

    /// Backend hook: look up the entry stored under `key`, expired or not.
    ///
    /// Implementors provide this; callers go through [`CacheService::get_value`]
    /// or [`CacheService::has`], which apply expiry.
    #[doc(hidden)]
    async fn find_entry(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Backend hook: remove an expired entry without making the caller wait.
    ///
    /// Called by [`CacheService::get_entry`] once it has seen the entry expire.
    #[doc(hidden)]
    fn evict_detached(&self, entry: CacheEntry);

    /// Store `value` under `key`, overwriting any existing entry in place
    async fn set_value(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Remove the entry for `key`; a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every entry whose expiry lies in the past, returning how many were removed
    async fn cleanup_expired(&self) -> Result<u64, CacheError>;

    /// Delete every entry regardless of expiry, returning how many were removed
    async fn clear(&self) -> Result<u64, CacheError>;

    /// Fresh entry for `key`, if any.
    ///
    /// Lookup failures are logged and reported as a miss. An expired entry is
    /// handed to [`CacheService::evict_detached`] and also reported as a miss.
    async fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        match self.find_entry(key).await {
            Ok(Some(entry)) if entry.is_expired() => {
                document_store::debug_log!(
                    "cache entry {} in {} expired at {}",
                    key,
                    self.collection_name(),
                    entry.expires_at
                );
                self.evict_detached(entry);
                None
            }
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    collection = self.collection_name(),
                    key,
                    error = %e,
                    "cache lookup failed, treating as miss"
                );
                None
            }
        }
    }

    async fn get_value(&self, key: &str) -> Option<Value> {
        self.get_entry(key).await.map(|entry| entry.value)
    }

    async fn has(&self, key: &str) -> bool {
        self.get_entry(key).await.is_some()
    }
}

/// Typed helpers available on every [`CacheService`]
#[async_trait]
pub trait CacheServiceExt: CacheService {
    /// Read and deserialize a cached value; undecodable values are a miss
    async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let raw = self.get_value(key).await?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    collection = self.collection_name(),
                    key,
                    error = %e,
                    "cached value could not be decoded, treating as miss"
                );
                None
            }
        }
    }

    /// Serialize and store a value; `None` uses [`CacheService::default_ttl`]
    async fn set<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = serde_json::to_value(value)?;
        let ttl = ttl_seconds.unwrap_or_else(|| self.default_ttl());
        self.set_value(key, raw, ttl).await
    }

    /// Return the cached value for `key`, or compute it with `producer` and cache it.
    ///
    /// No lock is held between the lookup and the write: concurrent callers
    /// racing on an unset key may each run `producer`. Callers that need
    /// at-most-once computation must serialize access themselves. A cached
    /// JSON `null` counts as a miss.
    async fn remember<T, F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        ttl_seconds: Option<u64>,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Into<anyhow::Error> + Send,
    {
        match self.get_value(key).await {
            Some(Value::Null) | None => {}
            Some(raw) => match serde_json::from_value::<T>(raw) {
                Ok(cached) => return Ok(cached),
                Err(e) => tracing::warn!(
                    collection = self.collection_name(),
                    key,
                    error = %e,
                    "cached value could not be decoded, recomputing"
                ),
            },
        }

        let value = producer()
            .await
            .map_err(|e| CacheError::Producer(e.into()))?;
        self.set(key, &value, ttl_seconds).await?;
        Ok(value)
    }
}

impl<S: CacheService + ?Sized> CacheServiceExt for S {}
