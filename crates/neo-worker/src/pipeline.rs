//! The video analysis job body.
//!
//! Both submission adapters ([`crate::BackgroundRunner`] and
//! [`crate::JobExecutor`]) call [`AnalysisPipeline::execute`]; nothing else
//! writes a terminal analysis status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::Instrument;

use neo_cache::{CacheResult, CacheStore};
use neo_media::MediaBackend;
use neo_ml::ModelSuite;
use neo_models::{keys, AnalysisRequest, AnalysisResult, JobId, VideoId, VideoStatus, ANALYSIS_INDEX};
use neo_search::{DocumentIndex, DocumentIndexExt};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Write the `analysis_status` field of `video:{video_id}`.
pub async fn write_status(cache: &dyn CacheStore, video_id: &VideoId, status: VideoStatus) -> CacheResult<()> {
    cache
        .hset(&keys::video(video_id), keys::ANALYSIS_STATUS_FIELD, status.as_str())
        .await
}

/// Read the `analysis_status` field of `video:{video_id}`.
pub async fn read_status(cache: &dyn CacheStore, video_id: &VideoId) -> CacheResult<Option<VideoStatus>> {
    let raw = cache
        .hget(&keys::video(video_id), keys::ANALYSIS_STATUS_FIELD)
        .await?;
    Ok(raw.as_deref().and_then(VideoStatus::parse))
}

/// Download, probe, analyse and persist one video.
pub struct AnalysisPipeline {
    cache: Arc<dyn CacheStore>,
    index: Arc<dyn DocumentIndex>,
    models: Arc<ModelSuite>,
    media: Arc<dyn MediaBackend>,
    analysis_frames: usize,
    timeout: Duration,
}

impl AnalysisPipeline {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        index: Arc<dyn DocumentIndex>,
        models: Arc<ModelSuite>,
        media: Arc<dyn MediaBackend>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            cache,
            index,
            models,
            media,
            analysis_frames: config.analysis_frames,
            timeout: config.job_timeout,
        }
    }

    /// Run one attempt and record its outcome.
    ///
    /// On success the result is upserted into `video_analysis` and the status
    /// becomes `completed`. On any failure the status becomes `failed` and no
    /// result is written by this attempt. The error is still returned so the
    /// queue adapter can decide on redelivery.
    ///
    /// The job timeout bounds the download and inference only. The index
    /// write runs after it, so a stored document always ends `completed`.
    pub async fn execute(&self, job_id: &JobId, request: &AnalysisRequest) -> WorkerResult<AnalysisResult> {
        let logger = JobLogger::new(job_id, &request.video_id, "analyze_video");
        let span = logger.create_span();
        self.attempt(request, &logger).instrument(span).await
    }

    async fn attempt(&self, request: &AnalysisRequest, logger: &JobLogger) -> WorkerResult<AnalysisResult> {
        logger.log_start(&request.video_url);
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.analyze(request, logger)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(WorkerError::Timeout(self.timeout.as_secs())),
        };
        let outcome = match outcome {
            Ok(result) => self.persist(result).await,
            Err(e) => Err(e),
        };

        let status = if outcome.is_ok() {
            VideoStatus::Completed
        } else {
            VideoStatus::Failed
        };
        metrics::counter!("neo_analysis_jobs_total", "status" => status.as_str()).increment(1);
        metrics::histogram!("neo_analysis_job_duration_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => {
                write_status(self.cache.as_ref(), &request.video_id, status).await?;
                logger.log_completion(&format!("in {:.1}s", started.elapsed().as_secs_f64()));
                Ok(result)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                if let Err(status_err) = write_status(self.cache.as_ref(), &request.video_id, status).await {
                    logger.log_error(&format!("could not record failed status: {}", status_err));
                }
                Err(e)
            }
        }
    }

    async fn analyze(&self, request: &AnalysisRequest, logger: &JobLogger) -> WorkerResult<AnalysisResult> {
        let video = self.media.download_video(&request.video_url).await?;
        logger.log_progress("downloaded");

        let metadata = self.media.extract_metadata(video.path()).await?;
        let frames: Vec<Vec<u8>> = self
            .media
            .extract_frames(video.path(), self.analysis_frames)
            .await?
            .into_iter()
            .map(|f| f.jpeg)
            .collect();
        logger.log_progress(&format!("extracted {} frames", frames.len()));

        let content_analysis = self.models.analyze_content(&metadata, &frames).await?;

        let result = AnalysisResult {
            video_id: request.video_id.clone(),
            user_id: request.user_id.clone(),
            metadata,
            content_analysis,
            processed_at: Utc::now(),
        };
        Ok(result)
    }

    async fn persist(&self, result: AnalysisResult) -> WorkerResult<AnalysisResult> {
        self.index
            .upsert_as(ANALYSIS_INDEX, result.video_id.as_str(), &result)
            .await?;
        Ok(result)
    }
}
