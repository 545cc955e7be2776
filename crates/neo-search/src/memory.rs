//! In-process document index.
//!
//! Scores a document by how many query terms occur in its string values.
//! Blank queries match every document that passes the filters.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use neo_models::SearchHit;

use crate::error::SearchResult;
use crate::index::{DocumentIndex, SearchRequest};

#[derive(Debug, Default)]
pub struct MemoryIndex {
    indices: RwLock<HashMap<String, BTreeMap<String, serde_json::Value>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `index`.
    pub async fn len(&self, index: &str) -> usize {
        self.indices.read().await.get(index).map_or(0, BTreeMap::len)
    }
}

fn collect_text(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::String(s) => {
            out.push(' ');
            out.push_str(&s.to_lowercase());
        }
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        serde_json::Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}

fn score(document: &serde_json::Value, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 1.0;
    }
    let mut text = String::new();
    collect_text(document, &mut text);
    terms
        .iter()
        .map(|term| text.matches(term.as_str()).count())
        .sum::<usize>() as f64
}

fn passes_filters(document: &serde_json::Value, filters: &BTreeMap<String, serde_json::Value>) -> bool {
    filters
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

#[async_trait]
impl DocumentIndex for MemoryIndex {
    async fn ping(&self) -> SearchResult<()> {
        Ok(())
    }

    async fn upsert(&self, index: &str, id: &str, document: &serde_json::Value) -> SearchResult<()> {
        let mut indices = self.indices.write().await;
        indices
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn get(&self, index: &str, id: &str) -> SearchResult<Option<serde_json::Value>> {
        let indices = self.indices.read().await;
        Ok(indices.get(index).and_then(|docs| docs.get(id)).cloned())
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<Vec<SearchHit>> {
        let terms: Vec<String> = request
            .text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let indices = self.indices.read().await;
        let Some(docs) = indices.get(index) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = docs
            .iter()
            .filter(|(_, doc)| passes_filters(doc, &request.filters))
            .map(|(id, doc)| SearchHit {
                id: id.clone(),
                score: score(doc, &terms),
                source: doc.clone(),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(request.size);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentIndexExt;
    use serde_json::json;

    async fn seeded() -> MemoryIndex {
        let index = MemoryIndex::new();
        index
            .upsert("videos", "a", &json!({"title": "cat video", "user_id": "u1"}))
            .await
            .unwrap();
        index
            .upsert("videos", "b", &json!({"title": "cat cat cat", "user_id": "u2"}))
            .await
            .unwrap();
        index
            .upsert("videos", "c", &json!({"title": "dog video", "user_id": "u1"}))
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn upsert_replaces_document() {
        let index = MemoryIndex::new();
        index.upsert("videos", "a", &json!({"v": 1})).await.unwrap();
        index.upsert("videos", "a", &json!({"v": 2})).await.unwrap();
        assert_eq!(index.len("videos").await, 1);
        assert_eq!(index.get("videos", "a").await.unwrap(), Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn search_ranks_by_term_count() {
        let index = seeded().await;
        let hits = index.search("videos", &SearchRequest::new("cat")).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn search_applies_filters_and_size() {
        let index = seeded().await;
        let request = SearchRequest::new("video").with_filter("user_id", json!("u1"));
        let hits = index.search("videos", &request).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = index
            .search("videos", &request.clone().with_size(1))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn search_unknown_index_is_empty() {
        let index = MemoryIndex::new();
        assert!(index.search("nope", &SearchRequest::new("x")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn typed_helpers() {
        let index = MemoryIndex::new();
        index
            .upsert_as("videos", "x", &json!({"video_id": "x"}))
            .await
            .unwrap();
        let doc: Option<serde_json::Value> = index.get_as("videos", "x").await.unwrap();
        assert_eq!(doc, Some(json!({"video_id": "x"})));
        let missing: Option<serde_json::Value> = index.get_as("videos", "y").await.unwrap();
        assert!(missing.is_none());
    }
}
