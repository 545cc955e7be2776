//! Cache error types.

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unhealthy: {0}")]
    Unhealthy(String),

    #[error("Wrong value type at key {0}")]
    WrongType(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    pub fn unhealthy(msg: impl Into<String>) -> Self {
        Self::Unhealthy(msg.into())
    }
}
