//! Search handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use neo_models::{SearchHit, SearchQuery};

use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::search;
use crate::state::AppContext;

#[derive(Serialize)]
pub struct SearchResponse {
    pub status: &'static str,
    pub results: Vec<SearchHit>,
    pub query: String,
    pub user_id: String,
}

pub async fn search_content(
    State(ctx): State<AppContext>,
    ValidatedJson(query): ValidatedJson<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let results = search::search(&ctx, &query).await?;
    Ok(Json(SearchResponse {
        status: "success",
        results,
        query: query.query,
        user_id: query.user_id,
    }))
}
