//! Content search and per-user search history.

use chrono::Utc;
use serde_json::Value;

use neo_cache::CacheStore;
use neo_models::{keys, JsonObject, SearchHistoryEntry, SearchHit, SearchQuery, ANALYSIS_INDEX};
use neo_search::{DocumentIndex, SearchRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppContext;

/// Turn caller filters into term filters. Only scalar values are accepted.
pub fn build_request(query: &SearchQuery) -> ApiResult<SearchRequest> {
    let mut request = SearchRequest::new(query.query.clone());
    for (field, value) in query.filters.iter().flat_map(JsonObject::iter) {
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                request = request.with_filter(field.clone(), value.clone());
            }
            other => {
                return Err(ApiError::validation(format!(
                    "filter `{}` must be a string, number or boolean, got {}",
                    field, other
                )))
            }
        }
    }
    Ok(request)
}

/// Search analysed videos and append the query to the user's history.
pub async fn search(ctx: &AppContext, query: &SearchQuery) -> ApiResult<Vec<SearchHit>> {
    let request = build_request(query)?;
    let hits = ctx.index.search(ANALYSIS_INDEX, &request).await?;

    let entry = SearchHistoryEntry {
        query: query.query.clone(),
        results_count: hits.len(),
        searched_at: Utc::now(),
    };
    let entry = serde_json::to_string(&entry).map_err(|e| ApiError::internal(e.to_string()))?;
    ctx.cache
        .push_capped(&keys::search_history(&query.user_id), &entry, keys::SEARCH_HISTORY_LIMIT)
        .await?;

    Ok(hits)
}
