//! Health check handler.

use axum::extract::State;
use axum::Json;

use crate::services::health::{self, HealthReport};
use crate::state::AppContext;

/// Always 200; the body says whether the stores answered.
pub async fn health_check(State(ctx): State<AppContext>) -> Json<HealthReport> {
    Json(health::check(&ctx).await)
}
