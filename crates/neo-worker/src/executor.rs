//! Queue-driven job executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use neo_queue::{JobQueue, QueueJob};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::AnalysisPipeline;

/// What to do with a message whose attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Leave it pending; it is reclaimed after the visibility timeout
    Redeliver,
    /// Move it to the dead-letter stream
    DeadLetter,
}

/// `attempts` counts failed deliveries so far; the first run is not a retry.
pub fn disposition(attempts: u32, max_retries: u32, permanent: bool) -> Disposition {
    if permanent || attempts > max_retries {
        Disposition::DeadLetter
    } else {
        Disposition::Redeliver
    }
}

/// Publish stream and dead-letter depths as gauges.
async fn record_queue_depth(queue: &JobQueue) {
    match queue.len().await {
        Ok(len) => metrics::gauge!("neo_queue_length").set(len as f64),
        Err(e) => debug!("Failed to read queue length: {}", e),
    }
    match queue.dlq_len().await {
        Ok(len) => metrics::gauge!("neo_queue_dlq_length").set(len as f64),
        Err(e) => debug!("Failed to read DLQ length: {}", e),
    }
}

/// Consumes analysis jobs from the stream and runs them through the pipeline.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    pipeline: Arc<AnalysisPipeline>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, queue: JobQueue, pipeline: Arc<AnalysisPipeline>) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            config,
            queue: Arc::new(queue),
            pipeline,
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claimer();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "In-flight jobs still running after {:?}; they will be reclaimed",
                self.config.shutdown_timeout
            );
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Periodically take over jobs abandoned by crashed consumers.
    fn spawn_claimer(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let pipeline = Arc::clone(&self.pipeline);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.config.claim_interval;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        record_queue_depth(&queue).await;

                        let free = semaphore.available_permits().min(5);
                        if free == 0 {
                            continue;
                        }
                        match queue.claim_pending(&consumer_name, free).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Claimed {} pending jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                                        break;
                                    };
                                    let queue = Arc::clone(&queue);
                                    let pipeline = Arc::clone(&pipeline);
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(pipeline, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Failed to claim pending jobs: {}", e),
                        }
                    }
                }
            }
        })
    }

    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let pipeline = Arc::clone(&self.pipeline);
            let queue = Arc::clone(&self.queue);
            let permit = Arc::clone(&self.job_semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(pipeline, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Run one delivery, then ack, leave for redelivery, or dead-letter it.
    async fn execute_job(pipeline: Arc<AnalysisPipeline>, queue: Arc<JobQueue>, message_id: String, job: QueueJob) {
        let job_id = job.job_id().clone();

        let result = match &job {
            QueueJob::AnalyzeVideo(j) => pipeline.execute(&j.job_id, &j.request).await,
        };

        match result {
            Ok(_) => {
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack job {}: {}", job_id, e);
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!("Failed to clear dedup key for job {}: {}", job_id, e);
                }
            }
            Err(e) => {
                let attempts = match queue.increment_retry(&message_id).await {
                    Ok(n) => n,
                    Err(retry_err) => {
                        warn!("Failed to count retry for job {}: {}", job_id, retry_err);
                        u32::MAX
                    }
                };
                let max_retries = queue.max_retries();

                match disposition(attempts, max_retries, e.is_permanent()) {
                    Disposition::DeadLetter => {
                        warn!(
                            "Job {} failed permanently after {} attempt(s), moving to DLQ",
                            job_id, attempts
                        );
                        if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                            error!("Failed to move job {} to DLQ: {}", job_id, dlq_err);
                        }
                        if let Err(e) = queue.clear_dedup(&job).await {
                            warn!("Failed to clear dedup key for job {}: {}", job_id, e);
                        }
                    }
                    Disposition::Redeliver => {
                        info!("Job {} will be retried (attempt {}/{})", job_id, attempts, max_retries);
                    }
                }
            }
        }
    }

    async fn wait_for_jobs(&self) {
        while self.job_semaphore.available_permits() < self.config.max_concurrent_jobs {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_until_budget_is_spent() {
        assert_eq!(disposition(1, 3, false), Disposition::Redeliver);
        assert_eq!(disposition(3, 3, false), Disposition::Redeliver);
        assert_eq!(disposition(4, 3, false), Disposition::DeadLetter);
        assert_eq!(disposition(1, 0, false), Disposition::DeadLetter);
    }

    #[test]
    fn permanent_failures_skip_retries() {
        assert_eq!(disposition(1, 3, true), Disposition::DeadLetter);
    }

    mod with_redis {
        use std::sync::Arc;

        use uuid::Uuid;

        use neo_cache::MemoryCache;
        use neo_models::{AnalysisRequest, VideoId, VideoStatus, ANALYSIS_INDEX};
        use neo_queue::{AnalyzeVideoJob, JobQueue, QueueConfig, QueueJob};
        use neo_search::MemoryIndex;

        use crate::executor::JobExecutor;
        use crate::pipeline::read_status;
        use crate::pipeline::tests::pipeline;

        fn isolated_queue(max_retries: u32) -> Arc<JobQueue> {
            let tag = Uuid::new_v4();
            let queue = JobQueue::new(QueueConfig {
                redis_url: "redis://localhost:6379/15".to_string(),
                stream_name: format!("neo:test:jobs:{}", tag),
                consumer_group: format!("neo:test:workers:{}", tag),
                dlq_stream_name: format!("neo:test:dlq:{}", tag),
                max_retries,
                ..QueueConfig::default()
            })
            .expect("client");
            Arc::new(queue)
        }

        fn job() -> AnalyzeVideoJob {
            let video_id = format!("exec-{}", Uuid::new_v4());
            AnalyzeVideoJob::new(AnalysisRequest {
                video_id: VideoId::from(video_id.as_str()),
                user_id: "u1".to_string(),
                video_url: format!("http://x/{}.mp4", video_id),
            })
        }

        /// Enqueue `job` and take delivery of it.
        async fn deliver(queue: &JobQueue, job: AnalyzeVideoJob) -> (String, QueueJob) {
            queue.init().await.expect("init");
            queue.enqueue_analysis(job).await.expect("enqueue");
            let mut delivered = queue.consume("test-consumer", 100, 1).await.expect("consume");
            assert_eq!(delivered.len(), 1);
            delivered.remove(0)
        }

        #[tokio::test]
        #[ignore = "requires Redis"]
        async fn success_acks_and_clears_dedup() {
            let queue = isolated_queue(3);
            let cache = Arc::new(MemoryCache::new());
            let index = Arc::new(MemoryIndex::new());
            let p = Arc::new(pipeline(cache.clone(), index.clone(), false));

            let job = job();
            let video_id = job.request.video_id.clone();
            let (message_id, delivered) = deliver(&queue, job.clone()).await;
            JobExecutor::execute_job(p, Arc::clone(&queue), message_id, delivered).await;

            assert_eq!(queue.len().await.unwrap(), 0);
            assert_eq!(queue.dlq_len().await.unwrap(), 0);
            assert_eq!(index.len(ANALYSIS_INDEX).await, 1);
            assert_eq!(
                read_status(cache.as_ref(), &video_id).await.unwrap(),
                Some(VideoStatus::Completed)
            );

            // Dedup marker is gone, so the same video can be submitted again.
            let again = AnalyzeVideoJob::new(job.request);
            queue.enqueue_analysis(again.clone()).await.expect("resubmit");
            queue.clear_dedup(&QueueJob::AnalyzeVideo(again)).await.unwrap();
        }

        #[tokio::test]
        #[ignore = "requires Redis"]
        async fn failure_within_budget_stays_for_redelivery() {
            let queue = isolated_queue(2);
            let cache = Arc::new(MemoryCache::new());
            let index = Arc::new(MemoryIndex::new());
            let p = Arc::new(pipeline(cache.clone(), index, true));

            let job = job();
            let video_id = job.request.video_id.clone();
            let (message_id, delivered) = deliver(&queue, job.clone()).await;
            JobExecutor::execute_job(p, Arc::clone(&queue), message_id, delivered).await;

            assert_eq!(queue.len().await.unwrap(), 1);
            assert_eq!(queue.dlq_len().await.unwrap(), 0);
            assert_eq!(
                read_status(cache.as_ref(), &video_id).await.unwrap(),
                Some(VideoStatus::Failed)
            );

            // Still in flight, so a duplicate submission is refused.
            assert!(queue.enqueue_analysis(AnalyzeVideoJob::new(job.request.clone())).await.is_err());
            queue.clear_dedup(&QueueJob::AnalyzeVideo(job)).await.unwrap();
        }

        #[tokio::test]
        #[ignore = "requires Redis"]
        async fn failure_past_budget_is_dead_lettered() {
            let queue = isolated_queue(0);
            let cache = Arc::new(MemoryCache::new());
            let index = Arc::new(MemoryIndex::new());
            let p = Arc::new(pipeline(cache.clone(), index, true));

            let job = job();
            let video_id = job.request.video_id.clone();
            let (message_id, delivered) = deliver(&queue, job).await;
            JobExecutor::execute_job(p, Arc::clone(&queue), message_id, delivered).await;

            assert_eq!(queue.len().await.unwrap(), 0);
            assert_eq!(queue.dlq_len().await.unwrap(), 1);
            assert_eq!(
                read_status(cache.as_ref(), &video_id).await.unwrap(),
                Some(VideoStatus::Failed)
            );
        }
    }
}
