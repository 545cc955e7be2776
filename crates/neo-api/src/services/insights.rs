//! Creator insights.

use chrono::Utc;
use tracing::debug;

use neo_cache::{CacheStore, CacheStoreExt};
use neo_models::{keys, AnalysisResult, CreatorInsightRequest, CreatorInsights, ANALYSIS_INDEX};
use neo_search::DocumentIndexExt;

use crate::error::ApiResult;
use crate::state::AppContext;

/// Summarise the creator's analysed videos and cache the result for a day.
///
/// Videos without an analysis are counted but not an error.
pub async fn generate(ctx: &AppContext, request: &CreatorInsightRequest) -> ApiResult<CreatorInsights> {
    let mut analyses = Vec::with_capacity(request.video_ids.len());
    for video_id in &request.video_ids {
        match ctx
            .index
            .get_as::<AnalysisResult>(ANALYSIS_INDEX, video_id.as_str())
            .await?
        {
            Some(analysis) => analyses.push(analysis),
            None => debug!(video_id = %video_id, "No analysis for video"),
        }
    }

    let summary = ctx
        .models
        .summarize_creator(&request.user_id, &analyses)
        .await?;

    let insights = CreatorInsights {
        user_id: request.user_id.clone(),
        video_count: request.video_ids.len(),
        analyzed_count: analyses.len(),
        summary,
        generated_at: Utc::now(),
    };

    ctx.cache
        .set_json(
            &keys::creator_insights(&request.user_id),
            &insights,
            Some(keys::CREATOR_INSIGHTS_TTL),
        )
        .await?;

    Ok(insights)
}
