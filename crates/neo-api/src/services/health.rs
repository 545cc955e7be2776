//! Liveness probes for the cache and the document index.

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use neo_cache::CacheStore;
use neo_search::DocumentIndex;

use crate::state::AppContext;

/// Outcome of one dependency probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Up,
    Down(String),
}

impl Probe {
    fn from_result<E: std::fmt::Display>(name: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Probe::Up,
            Err(e) => {
                warn!("{} probe failed: {}", name, e);
                Probe::Down(e.to_string())
            }
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Probe::Up)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub models_loaded: bool,
    pub redis_connected: bool,
    pub elasticsearch_connected: bool,
}

/// Probe both stores concurrently. Never fails.
pub async fn check(ctx: &AppContext) -> HealthReport {
    let (cache, index) = tokio::join!(ctx.cache.ping(), ctx.index.ping());
    let cache = Probe::from_result("cache", cache);
    let index = Probe::from_result("index", index);

    HealthReport {
        status: if cache.is_up() && index.is_up() {
            "healthy"
        } else {
            "unhealthy"
        },
        timestamp: Utc::now().to_rfc3339(),
        // Startup aborts unless every model loaded.
        models_loaded: true,
        redis_connected: cache.is_up(),
        elasticsearch_connected: index.is_up(),
    }
}
