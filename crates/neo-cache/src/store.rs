//! Cache contract shared by every backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheResult;

/// Key-value store with per-key expiry.
///
/// Implementations are safe to call from concurrent handlers without
/// external locking. Concurrent writes to one key race; the later wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Liveness probe. `Ok` only when the store answered correctly.
    async fn ping(&self) -> CacheResult<()>;

    /// Read a string value. Expired keys read as `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write a string value, replacing any previous value and expiry.
    /// `ttl: None` stores without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Read one field of a hash.
    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>>;

    /// Write one field of a hash, overwriting any prior value.
    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()>;

    /// Prepend to a list and trim it to the newest `max_len` entries.
    async fn push_capped(&self, key: &str, value: &str, max_len: usize) -> CacheResult<()>;

    /// Read up to `count` entries from the head (newest first) of a list.
    async fn list_head(&self, key: &str, count: usize) -> CacheResult<Vec<String>>;
}

/// JSON helpers over any [`CacheStore`].
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    async fn get_json<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw, ttl).await
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
