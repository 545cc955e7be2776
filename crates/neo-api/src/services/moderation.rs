//! Content moderation, routed by content type.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use neo_media::MediaBackend;
use neo_models::{ContentType, ModerationRecord, ModerationRequest, ModerationResult, MODERATION_INDEX};
use neo_search::DocumentIndexExt;

use crate::error::ApiResult;
use crate::state::AppContext;

/// Frames sampled from a video for violence detection.
const VIDEO_FRAMES: usize = 4;

/// Index id for a content URL. URLs are not safe document ids.
pub fn record_id(content_url: &str) -> String {
    format!("{:x}", Sha256::digest(content_url.as_bytes()))
}

async fn classify(ctx: &AppContext, request: &ModerationRequest) -> ApiResult<ModerationResult> {
    let result = match request.content_type {
        ContentType::Text => {
            let bytes = ctx.media.fetch_content(&request.content_url).await?;
            let text = String::from_utf8_lossy(&bytes);
            ModerationResult::combine([("toxicity", ctx.models.classify_toxicity(&text).await?)])
        }
        ContentType::Image => {
            let bytes = ctx.media.fetch_content(&request.content_url).await?;
            ModerationResult::combine([("violence", ctx.models.detect_violence(&[bytes]).await?)])
        }
        ContentType::Audio => {
            let bytes = ctx.media.fetch_content(&request.content_url).await?;
            let transcript = ctx.models.transcribe(&bytes).await?;
            ModerationResult::combine([("toxicity", ctx.models.classify_toxicity(&transcript).await?)])
        }
        ContentType::Video => {
            let video = ctx.media.download_video(&request.content_url).await?;
            let frames: Vec<Vec<u8>> = ctx
                .media
                .extract_frames(video.path(), VIDEO_FRAMES)
                .await?
                .into_iter()
                .map(|f| f.jpeg)
                .collect();
            ModerationResult::combine([("violence", ctx.models.detect_violence(&frames).await?)])
        }
    };
    Ok(result)
}

/// Classify, persist the record, and return the result.
pub async fn moderate(ctx: &AppContext, request: &ModerationRequest) -> ApiResult<ModerationResult> {
    let result = classify(ctx, request).await?;

    let record = ModerationRecord {
        content_url: request.content_url.clone(),
        user_id: request.user_id.clone(),
        content_type: request.content_type,
        result: result.clone(),
        moderated_at: Utc::now(),
    };
    ctx.index
        .upsert_as(MODERATION_INDEX, &record_id(&request.content_url), &record)
        .await?;

    info!(
        content_type = %request.content_type,
        verdict = ?result.verdict,
        "Content moderated"
    );
    Ok(result)
}
