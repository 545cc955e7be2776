//! Creator insights handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use neo_models::{CreatorInsightRequest, CreatorInsights};

use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::insights;
use crate::state::AppContext;

#[derive(Serialize)]
pub struct InsightsResponse {
    pub status: &'static str,
    pub insights: CreatorInsights,
    pub user_id: String,
}

pub async fn creator_insights(
    State(ctx): State<AppContext>,
    ValidatedJson(request): ValidatedJson<CreatorInsightRequest>,
) -> ApiResult<Json<InsightsResponse>> {
    let insights = insights::generate(&ctx, &request).await?;
    Ok(Json(InsightsResponse {
        status: "success",
        insights,
        user_id: request.user_id,
    }))
}
