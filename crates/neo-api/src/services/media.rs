//! Thumbnail generation and video enhancement.

use tracing::info;

use neo_media::{EnhancementPlan, MediaBackend, ThumbnailOptions};
use neo_models::{EnhancementRequest, ThumbnailRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppContext;

/// Index of the highest score; the earliest wins ties and NaN never wins.
pub fn best_frame(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Pick the best-scoring frame and publish it as a thumbnail.
pub async fn thumbnail(ctx: &AppContext, request: &ThumbnailRequest) -> ApiResult<String> {
    let options = ThumbnailOptions::from_options(request.options.as_ref())?;

    let video = ctx.media.download_video(&request.video_url).await?;
    let frames = ctx.media.extract_frames(video.path(), options.frame_count).await?;

    let jpegs: Vec<Vec<u8>> = frames.iter().map(|f| f.jpeg.clone()).collect();
    let scores = ctx.models.score_frames(&jpegs).await?;
    let best = best_frame(&scores)
        .and_then(|i| frames.get(i))
        .ok_or_else(|| ApiError::internal("image model returned no usable frame scores"))?;

    let url = ctx.media.render_thumbnail(best, options.width).await?;
    info!(frame = best.index, timestamp = best.timestamp, "Thumbnail generated");
    Ok(url)
}

/// Validate the requested enhancements, then render and publish the video.
pub async fn enhance(ctx: &AppContext, request: &EnhancementRequest) -> ApiResult<String> {
    let plan = EnhancementPlan::from_options(&request.enhancements)?;

    let video = ctx.media.download_video(&request.video_url).await?;
    let url = ctx.media.apply_enhancements(video.path(), &plan).await?;
    info!(filters = %plan.filter_chain(), "Video enhanced");
    Ok(url)
}
