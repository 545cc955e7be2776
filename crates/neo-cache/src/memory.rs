//! In-process cache with the same expiry semantics as Redis.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Expiring in-memory map. Entries past their TTL read as absent and are
/// dropped on the next write.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn live(&self, key: &str) -> Option<Entry> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.is_live(Instant::now()))
            .cloned()
    }

    /// Number of stored keys, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sweep(entries: &mut HashMap<String, Entry>, now: Instant) {
    entries.retain(|_, e| e.is_live(now));
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self.live(key).await.map(|e| e.value) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        sweep(&mut entries, Instant::now());
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        match self.live(key).await.map(|e| e.value) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(h.get(field).cloned()),
            Some(_) => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        sweep(&mut entries, Instant::now());
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: Value::Hash(HashMap::new()),
                expires_at: None,
            });
        match &mut entry.value {
            Value::Hash(h) => {
                h.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn push_capped(&self, key: &str, value: &str, max_len: usize) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        sweep(&mut entries, Instant::now());
        if max_len == 0 {
            // An empty list is no key at all.
            entries.remove(key);
            return Ok(());
        }
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: Value::List(VecDeque::new()),
                expires_at: None,
            });
        match &mut entry.value {
            Value::List(list) => {
                list.push_front(value.to_string());
                list.truncate(max_len);
                Ok(())
            }
            _ => Err(CacheError::WrongType(key.to_string())),
        }
    }

    async fn list_head(&self, key: &str, count: usize) -> CacheResult<Vec<String>> {
        match self.live(key).await.map(|e| e.value) {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => Ok(list.into_iter().take(count).collect()),
            Some(_) => Err(CacheError::WrongType(key.to_string())),
        }
    }
}
