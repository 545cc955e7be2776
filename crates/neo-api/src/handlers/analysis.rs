//! Video analysis handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use neo_models::{AnalysisRequest, AnalysisResult, JobId, VideoId};

use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::analysis;
use crate::state::AppContext;

#[derive(Serialize)]
pub struct AnalyzeVideoResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub video_id: VideoId,
    pub job_id: JobId,
}

/// Start an analysis and return before it runs.
pub async fn analyze_video(
    State(ctx): State<AppContext>,
    ValidatedJson(request): ValidatedJson<AnalysisRequest>,
) -> ApiResult<Json<AnalyzeVideoResponse>> {
    let video_id = request.video_id.clone();
    let job_id = analysis::submit(&ctx, request).await?;

    Ok(Json(AnalyzeVideoResponse {
        status: "processing",
        message: "Video analysis started",
        video_id,
        job_id,
    }))
}

#[derive(Serialize)]
pub struct AnalysisStatusResponse {
    pub status: &'static str,
    pub video_id: VideoId,
    pub analysis_status: &'static str,
}

pub async fn get_analysis_status(
    State(ctx): State<AppContext>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<AnalysisStatusResponse>> {
    let video_id = VideoId::from_string(video_id);
    let status = analysis::status(&ctx, &video_id).await?;

    Ok(Json(AnalysisStatusResponse {
        status: "success",
        video_id,
        analysis_status: status.as_str(),
    }))
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub status: &'static str,
    pub analysis: AnalysisResult,
}

pub async fn get_analysis(
    State(ctx): State<AppContext>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<AnalysisResponse>> {
    let analysis = analysis::result(&ctx, &VideoId::from_string(video_id)).await?;
    Ok(Json(AnalysisResponse {
        status: "success",
        analysis,
    }))
}
