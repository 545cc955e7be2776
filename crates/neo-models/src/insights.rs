//! Creator insight models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::VideoId;
use crate::JsonObject;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorInsightRequest {
    pub user_id: String,
    pub video_ids: Vec<VideoId>,
}

/// Aggregate over a creator's analyzed videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorInsights {
    pub user_id: String,
    /// Number of video ids in the request
    pub video_count: usize,
    /// How many of them had a stored analysis result
    pub analyzed_count: usize,
    /// Output of the content engine
    pub summary: JsonObject,
    pub generated_at: DateTime<Utc>,
}
