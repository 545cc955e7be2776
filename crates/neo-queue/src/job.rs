//! Job types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neo_models::{AnalysisRequest, JobId, VideoId};

/// Job to run the video analysis pipeline for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeVideoJob {
    /// Unique job ID
    pub job_id: JobId,
    /// What to analyze
    pub request: AnalysisRequest,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl AnalyzeVideoJob {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            job_id: JobId::new(),
            request,
            created_at: Utc::now(),
        }
    }

    /// One in-flight analysis per video.
    pub fn idempotency_key(&self) -> String {
        format!("analyze:{}", self.request.video_id)
    }
}

/// Generic job wrapper for queue storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    /// Download, extract metadata, run the content engine, persist
    AnalyzeVideo(AnalyzeVideoJob),
}

impl QueueJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueJob::AnalyzeVideo(j) => &j.job_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            QueueJob::AnalyzeVideo(j) => &j.request.user_id,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        match self {
            QueueJob::AnalyzeVideo(j) => &j.request.video_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::AnalyzeVideo(j) => j.idempotency_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            video_id: VideoId::from("v1"),
            user_id: "u1".to_string(),
            video_url: "http://x/v1.mp4".to_string(),
        }
    }

    #[test]
    fn idempotency_key_is_per_video() {
        let a = AnalyzeVideoJob::new(request());
        let b = AnalyzeVideoJob::new(request());
        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.idempotency_key(), "analyze:v1");
        assert_eq!(a.idempotency_key(), b.idempotency_key());
    }

    #[test]
    fn queue_job_is_tagged_by_type() {
        let job = QueueJob::AnalyzeVideo(AnalyzeVideoJob::new(request()));
        let json = serde_json::to_value(&job).expect("serialize QueueJob");
        assert_eq!(json["type"], "analyze_video");
        assert_eq!(json["request"]["video_id"], "v1");

        let decoded: QueueJob = serde_json::from_value(json).expect("deserialize QueueJob");
        assert_eq!(decoded.video_id().as_str(), "v1");
        assert_eq!(decoded.user_id(), "u1");
        assert_eq!(decoded.job_id(), job.job_id());
    }
}
