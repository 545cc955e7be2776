//! Recommendation and moderation handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use neo_models::{ContentType, ModerationRequest, ModerationResult, Recommendation, RecommendationRequest};

use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::{moderation, recommendations};
use crate::state::AppContext;

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub status: &'static str,
    pub recommendations: Vec<Recommendation>,
    pub user_id: String,
}

pub async fn generate_recommendations(
    State(ctx): State<AppContext>,
    ValidatedJson(request): ValidatedJson<RecommendationRequest>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let recommendations = recommendations::generate(&ctx, &request).await?;
    Ok(Json(RecommendationsResponse {
        status: "success",
        recommendations,
        user_id: request.user_id,
    }))
}

#[derive(Serialize)]
pub struct ModerationResponse {
    pub status: &'static str,
    pub moderation_result: ModerationResult,
    pub content_type: ContentType,
}

pub async fn moderate_content(
    State(ctx): State<AppContext>,
    ValidatedJson(request): ValidatedJson<ModerationRequest>,
) -> ApiResult<Json<ModerationResponse>> {
    let moderation_result = moderation::moderate(&ctx, &request).await?;
    Ok(Json(ModerationResponse {
        status: "completed",
        moderation_result,
        content_type: request.content_type,
    }))
}
