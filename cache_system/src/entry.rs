//! The cached value record shared by every backend

use crate::errors::CacheError;
use chrono::{DateTime, TimeDelta, Utc};
use document_store::timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default time-to-live for cache entries, in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Upper bound keeping `expires_at` representable (100 years)
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Store-assigned identifier, distinct from the cache key
    pub id: String,
    pub key: String,
    pub value: Value,
    /// Time-to-live in seconds, as supplied at write time
    pub ttl: u64,
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(id: String, key: &str, value: Value, ttl: u64) -> Result<Self, CacheError> {
        let now = timestamp::now();
        Ok(Self {
            id,
            key: key.to_string(),
            value,
            ttl,
            expires_at: Self::expiry_for(now, ttl)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Compute `now + ttl`, rejecting ttls that would overflow the calendar
    pub fn expiry_for(now: DateTime<Utc>, ttl: u64) -> Result<DateTime<Utc>, CacheError> {
        if ttl > MAX_TTL_SECONDS {
            return Err(CacheError::InvalidTtl(ttl));
        }
        TimeDelta::try_seconds(ttl as i64)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(CacheError::InvalidTtl(ttl))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(timestamp::now())
    }

    /// An entry is stale once `expires_at` is strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
