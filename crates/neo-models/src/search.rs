//! Search models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::JsonObject;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub user_id: String,
    #[serde(default)]
    pub filters: Option<JsonObject>,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub source: serde_json::Value,
}

/// Entry appended to `search_history:{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub results_count: usize,
    pub searched_at: DateTime<Utc>,
}
