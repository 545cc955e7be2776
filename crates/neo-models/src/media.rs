//! Thumbnail and enhancement request models.

use serde::{Deserialize, Serialize};

use crate::JsonObject;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub video_url: String,
    /// Optional `width` and `frame_count`
    #[serde(default)]
    pub options: Option<JsonObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementRequest {
    pub video_url: String,
    pub enhancements: JsonObject,
}
