//! Job queue using Redis Streams.

use std::time::Duration;

use redis::streams::{StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::{AnalyzeVideoJob, QueueJob};

/// Slack between the job timeout and the point a delivery counts as abandoned.
pub const CLAIM_GRACE: Duration = Duration::from_secs(60);

/// Retry counter lifetime.
const RETRY_TTL_SECS: i64 = 86_400;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// Max retries before DLQ
    pub max_retries: u32,
    /// How long a delivered job may stay unacknowledged before another
    /// worker may claim it
    pub visibility_timeout: Duration,
    /// Lifetime of the per-video dedup marker
    pub dedup_ttl: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://redis:6379/1".to_string(),
            stream_name: "neo:jobs".to_string(),
            consumer_group: "neo:workers".to_string(),
            dlq_stream_name: "neo:dlq".to_string(),
            max_retries: 3,
            visibility_timeout: Duration::from_secs(600),
            dedup_ttl: Duration::from_secs(3600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    ///
    /// Without `QUEUE_REDIS_URL` the queue lives in database 1 of the
    /// cache's Redis (`REDIS_HOST` / `REDIS_PORT`).
    pub fn from_env() -> Self {
        let redis_url = std::env::var("QUEUE_REDIS_URL").unwrap_or_else(|_| {
            let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "redis".to_string());
            let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
            format!("redis://{}:{}/1", host, port)
        });

        Self {
            redis_url,
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or_else(|_| "neo:jobs".to_string()),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or_else(|_| "neo:workers".to_string()),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM")
                .unwrap_or_else(|_| "neo:dlq".to_string()),
            max_retries: std::env::var("QUEUE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            visibility_timeout: Duration::from_secs(
                std::env::var("QUEUE_VISIBILITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            dedup_ttl: Duration::from_secs(
                std::env::var("QUEUE_DEDUP_TTL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }

    /// Stretch the timeouts so a job that runs for up to `job_timeout` is
    /// never claimed by a second worker and its dedup marker outlives every
    /// attempt.
    pub fn covering(mut self, job_timeout: Duration) -> Self {
        let min_visibility = job_timeout.saturating_add(CLAIM_GRACE);
        if self.visibility_timeout < min_visibility {
            warn!(
                "Visibility timeout {:?} is shorter than job timeout {:?}; raising to {:?}",
                self.visibility_timeout, job_timeout, min_visibility
            );
            self.visibility_timeout = min_visibility;
        }

        let attempts = self.max_retries.saturating_add(1);
        let min_dedup = self
            .visibility_timeout
            .checked_mul(attempts)
            .unwrap_or(Duration::MAX);
        self.dedup_ttl = self.dedup_ttl.max(min_dedup);
        self
    }
}

fn dedup_key(idempotency_key: &str) -> String {
    format!("neo:dedup:{}", idempotency_key)
}

fn retry_key(message_id: &str) -> String {
    format!("neo:retry:{}", message_id)
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a video analysis job.
    pub async fn enqueue_analysis(&self, job: AnalyzeVideoJob) -> QueueResult<String> {
        self.enqueue(QueueJob::AnalyzeVideo(job)).await
    }

    async fn enqueue(&self, job: QueueJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(&job)?;
        let idempotency_key = job.idempotency_key();

        // SET NX claims the key atomically; a second submission for the
        // same video loses until the first one is acked or dead-lettered.
        let dedup_key = dedup_key(&idempotency_key);
        let claimed: bool = redis::cmd("SET")
            .arg(&dedup_key)
            .arg(job.job_id().as_str())
            .arg("NX")
            .arg("EX")
            .arg(self.config.dedup_ttl.as_secs().max(1))
            .query_async::<Option<String>>(&mut conn)
            .await?
            .is_some();
        if !claimed {
            warn!("Duplicate job rejected: {}", idempotency_key);
            return Err(QueueError::Duplicate(idempotency_key));
        }

        let message_id: String = match redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&idempotency_key)
            .query_async(&mut conn)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                conn.del::<_, ()>(&dedup_key).await.ok();
                return Err(QueueError::enqueue_failed(e.to_string()));
            }
        };

        info!(
            job_id = %job.job_id(),
            video_id = %job.video_id(),
            "Enqueued job with message ID {}",
            message_id
        );

        Ok(message_id)
    }

    /// Acknowledge a job and delete it from the stream.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged job: {}", message_id);
        Ok(())
    }

    /// Move a job to the dead letter queue.
    pub async fn dlq(&self, message_id: &str, job: &QueueJob, error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(message_id).await?;

        warn!("Moved job {} to DLQ: {}", job.job_id(), error);
        Ok(())
    }

    /// Allow the job's video to be submitted again.
    pub async fn clear_dedup(&self, job: &QueueJob) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(dedup_key(&job.idempotency_key())).await?;
        Ok(())
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Get DLQ length.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.dlq_stream_name).await?;
        Ok(len)
    }

    /// Read new jobs for this consumer, blocking up to `block_ms`.
    pub async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let reply: Option<StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let entries = reply
            .map(|r| r.keys.into_iter().flat_map(|k| k.ids).collect())
            .unwrap_or_default();

        Ok(self.decode_entries(entries).await)
    }

    /// Claim jobs delivered to another consumer and left unacknowledged for
    /// longer than the visibility timeout.
    pub async fn claim_pending(
        &self,
        consumer_name: &str,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let min_idle_ms = self.config.visibility_timeout.as_millis() as usize;

        let pending: StreamPendingCountReply = conn
            .xpending_count(
                &self.config.stream_name,
                &self.config.consumer_group,
                "-",
                "+",
                count,
            )
            .await?;

        let stale: Vec<String> = pending
            .ids
            .into_iter()
            .filter(|p| p.last_delivered_ms >= min_idle_ms)
            .map(|p| p.id)
            .collect();

        if stale.is_empty() {
            return Ok(Vec::new());
        }

        let claimed: StreamClaimReply = conn
            .xclaim(
                &self.config.stream_name,
                &self.config.consumer_group,
                consumer_name,
                min_idle_ms,
                &stale[..],
            )
            .await?;

        let jobs = self.decode_entries(claimed.ids).await;
        for (_, job) in &jobs {
            info!("Claimed pending job {} from stream", job.job_id());
        }
        Ok(jobs)
    }

    async fn decode_entries(&self, entries: Vec<StreamId>) -> Vec<(String, QueueJob)> {
        let mut jobs = Vec::new();

        for entry in entries {
            let message_id = entry.id.clone();
            let payload: Option<String> = entry.get("job");

            match payload.map(|p| serde_json::from_str::<QueueJob>(&p)) {
                Some(Ok(job)) => {
                    debug!("Consumed job {} from stream", job.job_id());
                    jobs.push((message_id, job));
                }
                Some(Err(e)) => {
                    warn!("Failed to parse job payload {}: {}", message_id, e);
                    // Ack the malformed message to prevent reprocessing
                    self.ack(&message_id).await.ok();
                }
                None => {
                    warn!("Stream entry {} has no job field", message_id);
                    self.ack(&message_id).await.ok();
                }
            }
        }

        jobs
    }

    /// Increment retry count for a job.
    pub async fn increment_retry(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = retry_key(message_id);
        let count: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, RETRY_TTL_SECS).await?;
        Ok(count)
    }

    /// Get max retries from config.
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_models::{AnalysisRequest, VideoId};
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "QUEUE_REDIS_URL",
            "REDIS_HOST",
            "REDIS_PORT",
            "QUEUE_STREAM",
            "QUEUE_MAX_RETRIES",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn config_defaults_to_cache_redis_db_one() {
        clear_env();
        let config = QueueConfig::from_env();
        assert_eq!(config.redis_url, "redis://redis:6379/1");
        assert_eq!(config.stream_name, "neo:jobs");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    #[serial]
    fn config_follows_redis_host() {
        clear_env();
        std::env::set_var("REDIS_HOST", "cache.local");
        std::env::set_var("QUEUE_MAX_RETRIES", "5");
        let config = QueueConfig::from_env();
        assert_eq!(config.redis_url, "redis://cache.local:6379/1");
        assert_eq!(config.max_retries, 5);
        clear_env();
    }

    #[test]
    fn timeouts_cover_long_jobs() {
        let config = QueueConfig::default().covering(Duration::from_secs(3600));
        assert_eq!(config.visibility_timeout, Duration::from_secs(3660));
        assert_eq!(config.dedup_ttl, Duration::from_secs(3660 * 4));

        let roomy = QueueConfig {
            visibility_timeout: Duration::from_secs(7200),
            dedup_ttl: Duration::from_secs(86_400),
            ..QueueConfig::default()
        }
        .covering(Duration::from_secs(60));
        assert_eq!(roomy.visibility_timeout, Duration::from_secs(7200));
        assert_eq!(roomy.dedup_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn key_schema() {
        assert_eq!(dedup_key("analyze:v1"), "neo:dedup:analyze:v1");
        assert_eq!(retry_key("1-0"), "neo:retry:1-0");
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn duplicate_submission_is_rejected() {
        let queue = JobQueue::new(QueueConfig {
            redis_url: "redis://localhost:6379/15".to_string(),
            stream_name: "neo:test:jobs".to_string(),
            ..QueueConfig::default()
        })
        .expect("client");
        queue.init().await.expect("init");

        let request = AnalysisRequest {
            video_id: VideoId::from("dup"),
            user_id: "u1".to_string(),
            video_url: "http://x/dup.mp4".to_string(),
        };
        let first = AnalyzeVideoJob::new(request.clone());
        queue.enqueue_analysis(first.clone()).await.expect("first");
        let second = queue.enqueue_analysis(AnalyzeVideoJob::new(request)).await;
        assert!(matches!(second, Err(QueueError::Duplicate(_))));

        queue
            .clear_dedup(&QueueJob::AnalyzeVideo(first))
            .await
            .expect("clear");
    }
}
