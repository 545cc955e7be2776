//! Shared data models for the NeoVideo AI service.
//!
//! This crate provides Serde-serializable types for:
//! - Request bodies accepted by every endpoint
//! - Analysis jobs, results and per-video status
//! - Moderation, recommendation, search and creator-insight payloads
//! - The cache key schema and fixed per-feature TTLs

pub mod analysis;
pub mod ids;
pub mod insights;
pub mod keys;
pub mod media;
pub mod moderation;
pub mod recommendation;
pub mod search;

pub use analysis::{AnalysisRequest, AnalysisResult, VideoStatus, ANALYSIS_INDEX};
pub use ids::{JobId, VideoId};
pub use insights::{CreatorInsightRequest, CreatorInsights};
pub use media::{EnhancementRequest, ThumbnailRequest};
pub use moderation::{
    ContentType, ModerationRecord, ModerationRequest, ModerationResult, ModerationVerdict,
    MODERATION_INDEX,
};
pub use recommendation::{Recommendation, RecommendationRequest};
pub use search::{SearchHistoryEntry, SearchHit, SearchQuery};

/// Free-form JSON object used for model outputs and caller-supplied options.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
