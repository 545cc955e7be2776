//! Video analysis job models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::VideoId;
use crate::JsonObject;

/// Document index holding one [`AnalysisResult`] per video.
pub const ANALYSIS_INDEX: &str = "video_analysis";

/// Request to analyze a video in the background.
///
/// Immutable once submitted; lives for the duration of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub video_id: VideoId,
    pub user_id: String,
    pub video_url: String,
}

/// Output of a completed analysis job.
///
/// Upserted into [`ANALYSIS_INDEX`] under `video_id`; a re-run overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub video_id: VideoId,
    pub user_id: String,
    pub metadata: JsonObject,
    pub content_analysis: JsonObject,
    pub processed_at: DateTime<Utc>,
}

/// Per-video analysis status stored in the cache hash `video:{video_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Submitted, no attempt has finished yet
    Pending,
    /// Last attempt persisted an [`AnalysisResult`]
    Completed,
    /// Last attempt failed; nothing was persisted by it
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Parse the cache field value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(VideoStatus::Pending),
            "completed" => Some(VideoStatus::Completed),
            "failed" => Some(VideoStatus::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
