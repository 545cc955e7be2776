//! Submission adapters for analysis jobs.
//!
//! [`BackgroundRunner`] runs the job on the current tokio runtime;
//! [`QueueDispatch`] hands it to the Redis stream for a `neo-worker` process.
//! Either way the job body is [`AnalysisPipeline::execute`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::info;

use neo_models::{AnalysisRequest, JobId};
use neo_queue::{AnalyzeVideoJob, JobQueue};

use crate::error::WorkerResult;
use crate::pipeline::AnalysisPipeline;

/// Accepts an analysis request without waiting for it to run.
#[async_trait]
pub trait AnalysisDispatch: Send + Sync {
    async fn submit(&self, request: AnalysisRequest) -> WorkerResult<JobId>;

    /// Short name for logs.
    fn mode(&self) -> &'static str;
}

/// Fire-and-forget execution inside the calling process.
#[derive(Clone)]
pub struct BackgroundRunner {
    pipeline: Arc<AnalysisPipeline>,
}

impl BackgroundRunner {
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self { pipeline }
    }

    /// Spawn one attempt. Dropping the handle detaches the task.
    pub fn spawn(&self, request: AnalysisRequest) -> (JobId, JoinHandle<()>) {
        let job_id = JobId::new();
        let pipeline = Arc::clone(&self.pipeline);
        let id = job_id.clone();
        let handle = tokio::spawn(async move {
            // Outcome is recorded in the status field by the pipeline.
            let _ = pipeline.execute(&id, &request).await;
        });
        (job_id, handle)
    }
}

#[async_trait]
impl AnalysisDispatch for BackgroundRunner {
    async fn submit(&self, request: AnalysisRequest) -> WorkerResult<JobId> {
        let (job_id, _detached) = self.spawn(request);
        Ok(job_id)
    }

    fn mode(&self) -> &'static str {
        "inline"
    }
}

/// Durable execution through the job stream.
#[derive(Clone)]
pub struct QueueDispatch {
    queue: Arc<JobQueue>,
}

impl QueueDispatch {
    pub fn new(queue: Arc<JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl AnalysisDispatch for QueueDispatch {
    async fn submit(&self, request: AnalysisRequest) -> WorkerResult<JobId> {
        let job = AnalyzeVideoJob::new(request);
        let job_id = job.job_id.clone();
        let message_id = self.queue.enqueue_analysis(job).await?;
        info!(job_id = %job_id, message_id = %message_id, "Enqueued analysis job");
        Ok(job_id)
    }

    fn mode(&self) -> &'static str {
        "queue"
    }
}
