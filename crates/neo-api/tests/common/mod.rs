//! Shared fixtures: in-memory stores, canned models and a scripted media backend.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use neo_api::{create_router, ApiConfig, AppContext};
use neo_cache::{CacheStore, MemoryCache};
use neo_media::{EnhancementPlan, Frame, LocalVideo, MediaBackend, MediaError, MediaResult};
use neo_ml::{Engines, InferenceEngine, InferenceInput, MlResult, ModelSuite};
use neo_models::JsonObject;
use neo_search::{DocumentIndex, MemoryIndex};

/// Answers every call with the same JSON.
pub struct Canned(pub Value);

#[async_trait]
impl InferenceEngine for Canned {
    fn model_id(&self) -> &str {
        "canned"
    }

    async fn infer(&self, _input: InferenceInput) -> MlResult<Value> {
        Ok(self.0.clone())
    }
}

/// Scores each frame by its first byte, so the frame order decides the winner.
pub struct ByteScorer;

#[async_trait]
impl InferenceEngine for ByteScorer {
    fn model_id(&self) -> &str {
        "byte-scorer"
    }

    async fn infer(&self, input: InferenceInput) -> MlResult<Value> {
        let scores: Vec<f64> = match input {
            InferenceInput::Images(frames) => frames
                .iter()
                .map(|f| f.first().copied().unwrap_or(0) as f64 / 10.0)
                .collect(),
            _ => Vec::new(),
        };
        Ok(json!({ "scores": scores }))
    }
}

pub fn models() -> Arc<ModelSuite> {
    Arc::new(ModelSuite::from_engines(Engines {
        content: Arc::new(Canned(json!({"topics": ["cats"], "quality": 0.9}))),
        recommendation: Arc::new(Canned(json!({"recommendations": [
            {"video_id": "v9", "score": 0.9, "reason": "similar topics"},
            {"video_id": "v3", "score": 0.4}
        ]}))),
        toxicity: Arc::new(Canned(json!({"scores": {"toxic": 0.91, "insult": 0.2}}))),
        violence: Arc::new(Canned(json!({"scores": {"violence": 0.1}}))),
        image: Arc::new(ByteScorer),
        speech: Arc::new(Canned(json!({"text": "hello there"}))),
    }))
}

/// Media backend that never touches the network and counts every call.
#[derive(Default)]
pub struct StubMedia {
    pub calls: AtomicUsize,
}

impl StubMedia {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaBackend for StubMedia {
    async fn download_video(&self, url: &str) -> MediaResult<LocalVideo> {
        self.touch();
        if url.contains("missing") {
            return Err(MediaError::download_failed(format!("{} returned 404", url)));
        }
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("source.mp4"), b"video")?;
        Ok(LocalVideo::new(dir, "source.mp4"))
    }

    async fn extract_metadata(&self, _video: &Path) -> MediaResult<JsonObject> {
        self.touch();
        Ok(json!({"duration": 12.0, "width": 1920, "height": 1080})
            .as_object()
            .cloned()
            .unwrap_or_default())
    }

    async fn extract_frames(&self, _video: &Path, count: usize) -> MediaResult<Vec<Frame>> {
        self.touch();
        // Frame 2 carries the highest byte.
        Ok((0..count)
            .map(|index| Frame {
                index,
                timestamp: index as f64 * 1.5,
                jpeg: vec![if index == 2 { 9 } else { 1 }],
            })
            .collect())
    }

    async fn fetch_content(&self, _url: &str) -> MediaResult<Vec<u8>> {
        self.touch();
        Ok(b"you are terrible".to_vec())
    }

    async fn render_thumbnail(&self, frame: &Frame, width: u32) -> MediaResult<String> {
        self.touch();
        Ok(format!("https://cdn.test/thumbnails/frame-{}-w{}.jpg", frame.index, width))
    }

    async fn apply_enhancements(&self, _video: &Path, plan: &EnhancementPlan) -> MediaResult<String> {
        self.touch();
        Ok(format!("https://cdn.test/enhanced/{}.mp4", plan.filters().len()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub cache: Arc<MemoryCache>,
    pub index: Arc<MemoryIndex>,
    pub media: Arc<StubMedia>,
}

impl TestApp {
    pub fn new() -> Self {
        let index = Arc::new(MemoryIndex::new());
        Self::with_index(index.clone(), index)
    }

    /// Use `served` as the index behind the router; `index` is kept for assertions.
    pub fn with_index(index: Arc<MemoryIndex>, served: Arc<dyn DocumentIndex>) -> Self {
        Self::assemble(None, index, served)
    }

    /// Serve `cache` instead of the in-memory one, which then stays unused.
    pub fn with_cache(cache: Arc<dyn CacheStore>) -> Self {
        let index = Arc::new(MemoryIndex::new());
        Self::assemble(Some(cache), index.clone(), index)
    }

    fn assemble(
        served_cache: Option<Arc<dyn CacheStore>>,
        index: Arc<MemoryIndex>,
        served_index: Arc<dyn DocumentIndex>,
    ) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let served_cache = served_cache.unwrap_or_else(|| cache.clone());
        let media = Arc::new(StubMedia::default());
        let ctx = AppContext::new(
            ApiConfig::default(),
            served_cache,
            served_index,
            models(),
            media.clone(),
        );
        Self {
            router: create_router(ctx, None),
            cache,
            index,
            media,
        }
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}
