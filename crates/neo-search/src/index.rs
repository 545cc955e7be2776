//! Document index contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use neo_models::SearchHit;

use crate::error::SearchResult;

/// Free-text query with exact-match filters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Text matched against every field
    pub text: String,
    /// Field name to exact value; all must match
    pub filters: BTreeMap<String, serde_json::Value>,
    /// Maximum number of hits
    pub size: usize,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: BTreeMap::new(),
            size: 20,
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

/// Structured document store keyed by id.
///
/// Writes are upserts: indexing an existing id replaces the document.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Liveness probe. `Ok` only when the engine answered.
    async fn ping(&self) -> SearchResult<()>;

    /// Create or replace the document `id` in `index`.
    async fn upsert(&self, index: &str, id: &str, document: &serde_json::Value) -> SearchResult<()>;

    /// Fetch the document `id`, `None` when absent.
    async fn get(&self, index: &str, id: &str) -> SearchResult<Option<serde_json::Value>>;

    /// Ranked hits for `request`, best first.
    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<Vec<SearchHit>>;
}

/// Typed helpers over any [`DocumentIndex`].
#[async_trait]
pub trait DocumentIndexExt: DocumentIndex {
    async fn upsert_as<T>(&self, index: &str, id: &str, document: &T) -> SearchResult<()>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(document)?;
        self.upsert(index, id, &value).await
    }

    async fn get_as<T>(&self, index: &str, id: &str) -> SearchResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(index, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

impl<I: DocumentIndex + ?Sized> DocumentIndexExt for I {}
