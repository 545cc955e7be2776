//! Analysis submission and the status/result read paths.

use tracing::info;

use neo_models::{AnalysisRequest, AnalysisResult, JobId, VideoId, VideoStatus, ANALYSIS_INDEX};
use neo_search::DocumentIndexExt;
use neo_worker::{read_status, write_status, AnalysisDispatch};

use crate::error::{ApiError, ApiResult};
use crate::state::AppContext;

/// Mark the video pending and hand the job to the configured adapter.
pub async fn submit(ctx: &AppContext, request: AnalysisRequest) -> ApiResult<JobId> {
    write_status(ctx.cache.as_ref(), &request.video_id, VideoStatus::Pending).await?;

    let video_id = request.video_id.clone();
    let job_id = ctx.dispatch.submit(request).await?;
    info!(video_id = %video_id, job_id = %job_id, mode = ctx.dispatch.mode(), "Video analysis submitted");
    Ok(job_id)
}

pub async fn status(ctx: &AppContext, video_id: &VideoId) -> ApiResult<VideoStatus> {
    read_status(ctx.cache.as_ref(), video_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No analysis status for video {}", video_id)))
}

pub async fn result(ctx: &AppContext, video_id: &VideoId) -> ApiResult<AnalysisResult> {
    ctx.index
        .get_as(ANALYSIS_INDEX, video_id.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No analysis result for video {}", video_id)))
}
