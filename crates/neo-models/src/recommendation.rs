//! Recommendation models.

use serde::{Deserialize, Serialize};

use crate::ids::VideoId;
use crate::JsonObject;

/// Request for recommendations in the context of one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub video_id: VideoId,
    #[serde(default)]
    pub context: Option<JsonObject>,
}

/// One recommended content item, in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub video_id: VideoId,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
