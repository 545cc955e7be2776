//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    #[error("Media error: {0}")]
    Media(#[from] neo_media::MediaError),

    #[error("Inference error: {0}")]
    Ml(#[from] neo_ml::MlError),

    #[error("Search error: {0}")]
    Search(#[from] neo_search::SearchError),

    #[error("Cache error: {0}")]
    Cache(#[from] neo_cache::CacheError),

    #[error("Queue error: {0}")]
    Queue(#[from] neo_queue::QueueError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Failures that will not go away on redelivery.
    pub fn is_permanent(&self) -> bool {
        match self {
            WorkerError::Media(e) => e.is_validation(),
            WorkerError::Ml(neo_ml::MlError::InvalidInput(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_url_is_permanent() {
        let err = WorkerError::from(neo_media::MediaError::UnsupportedUrl("ftp://x".into()));
        assert!(err.is_permanent());
        assert!(!WorkerError::Timeout(10).is_permanent());
    }
}
