//! Thumbnail and enhancement handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use neo_models::{EnhancementRequest, ThumbnailRequest};

use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::media;
use crate::state::AppContext;

#[derive(Serialize)]
pub struct ThumbnailResponse {
    pub status: &'static str,
    pub thumbnail_url: String,
    pub video_url: String,
}

pub async fn generate_thumbnail(
    State(ctx): State<AppContext>,
    ValidatedJson(request): ValidatedJson<ThumbnailRequest>,
) -> ApiResult<Json<ThumbnailResponse>> {
    let thumbnail_url = media::thumbnail(&ctx, &request).await?;
    Ok(Json(ThumbnailResponse {
        status: "completed",
        thumbnail_url,
        video_url: request.video_url,
    }))
}

#[derive(Serialize)]
pub struct EnhancementResponse {
    pub status: &'static str,
    pub enhanced_video_url: String,
    pub original_video_url: String,
}

pub async fn enhance_video(
    State(ctx): State<AppContext>,
    ValidatedJson(request): ValidatedJson<EnhancementRequest>,
) -> ApiResult<Json<EnhancementResponse>> {
    let enhanced_video_url = media::enhance(&ctx, &request).await?;
    Ok(Json(EnhancementResponse {
        status: "completed",
        enhanced_video_url,
        original_video_url: request.video_url,
    }))
}
