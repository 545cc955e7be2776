//! Recommendation generation.

use serde_json::Value;
use tracing::warn;

use neo_cache::{CacheStore, CacheStoreExt};
use neo_models::{keys, JsonObject, Recommendation, RecommendationRequest, ANALYSIS_INDEX};
use neo_search::DocumentIndex;

use crate::error::ApiResult;
use crate::state::AppContext;

/// Stored preferences, or an empty object when absent or unreadable.
async fn user_preferences(ctx: &AppContext, user_id: &str) -> ApiResult<JsonObject> {
    let Some(raw) = ctx.cache.get(&keys::user_preferences(user_id)).await? else {
        return Ok(JsonObject::new());
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(prefs)) => Ok(prefs),
        Ok(other) => {
            warn!(user_id = %user_id, "Ignoring non-object preferences: {}", other);
            Ok(JsonObject::new())
        }
        Err(e) => {
            warn!(user_id = %user_id, "Ignoring unparseable preferences: {}", e);
            Ok(JsonObject::new())
        }
    }
}

/// Compute, cache for an hour, and return recommendations.
///
/// The cache is written, never read, here: every request recomputes.
pub async fn generate(ctx: &AppContext, request: &RecommendationRequest) -> ApiResult<Vec<Recommendation>> {
    let preferences = user_preferences(ctx, &request.user_id).await?;

    let video = match ctx.index.get(ANALYSIS_INDEX, request.video_id.as_str()).await? {
        Some(Value::Object(doc)) => doc,
        _ => JsonObject::new(),
    };
    let mut context = JsonObject::new();
    context.insert("video_id".into(), Value::String(request.video_id.to_string()));
    context.insert("video".into(), Value::Object(video));
    context.insert(
        "request".into(),
        Value::Object(request.context.clone().unwrap_or_default()),
    );

    let recommendations = ctx
        .models
        .recommend(&request.user_id, &preferences, &context)
        .await?;

    ctx.cache
        .set_json(
            &keys::recommendations(&request.user_id),
            &recommendations,
            Some(keys::RECOMMENDATIONS_TTL),
        )
        .await?;

    Ok(recommendations)
}
