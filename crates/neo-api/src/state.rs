//! Application context.

use std::sync::Arc;

use tracing::info;

use neo_cache::{CacheStore, MemoryCache, RedisCache};
use neo_media::{FfmpegMedia, MediaBackend};
use neo_ml::{MlConfig, ModelSuite};
use neo_queue::{JobQueue, QueueConfig};
use neo_search::{DocumentIndex, ElasticClient};
use neo_worker::{AnalysisDispatch, AnalysisPipeline, BackgroundRunner, QueueDispatch, WorkerConfig};

use crate::config::{ApiConfig, CacheBackend, DispatchMode};

/// Everything a handler may touch. Built once at startup, never reassigned.
#[derive(Clone)]
pub struct AppContext {
    pub config: ApiConfig,
    pub cache: Arc<dyn CacheStore>,
    pub index: Arc<dyn DocumentIndex>,
    pub models: Arc<ModelSuite>,
    pub media: Arc<dyn MediaBackend>,
    pub dispatch: Arc<dyn AnalysisDispatch>,
}

impl AppContext {
    /// Build from environment. Models are loaded here; any load failure
    /// aborts startup.
    pub async fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let cache: Arc<dyn CacheStore> = match config.cache_backend {
            CacheBackend::Redis => Arc::new(RedisCache::from_env()?),
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
        };
        let index: Arc<dyn DocumentIndex> = Arc::new(ElasticClient::from_env()?);
        let media: Arc<dyn MediaBackend> = Arc::new(FfmpegMedia::from_env()?);
        let models = Arc::new(ModelSuite::load(&MlConfig::from_env()).await?);

        let worker_config = WorkerConfig::from_env();
        let dispatch: Arc<dyn AnalysisDispatch> = match config.dispatch {
            DispatchMode::Inline => {
                let pipeline = AnalysisPipeline::new(
                    Arc::clone(&cache),
                    Arc::clone(&index),
                    Arc::clone(&models),
                    Arc::clone(&media),
                    &worker_config,
                );
                Arc::new(BackgroundRunner::new(Arc::new(pipeline)))
            }
            DispatchMode::Queue => {
                // Same timeouts as the workers, so the dedup marker outlives every attempt.
                let queue_config = QueueConfig::from_env().covering(worker_config.job_timeout);
                let queue = JobQueue::new(queue_config)?;
                queue.init().await?;
                Arc::new(QueueDispatch::new(Arc::new(queue)))
            }
        };
        info!("Analysis jobs dispatched {}", dispatch.mode());

        Ok(Self {
            config,
            cache,
            index,
            models,
            media,
            dispatch,
        })
    }

    /// Assemble from ready-made collaborators; analysis runs in-process.
    pub fn new(
        config: ApiConfig,
        cache: Arc<dyn CacheStore>,
        index: Arc<dyn DocumentIndex>,
        models: Arc<ModelSuite>,
        media: Arc<dyn MediaBackend>,
    ) -> Self {
        let pipeline = AnalysisPipeline::new(
            Arc::clone(&cache),
            Arc::clone(&index),
            Arc::clone(&models),
            Arc::clone(&media),
            &WorkerConfig::default(),
        );
        Self {
            config,
            cache,
            index,
            models,
            media,
            dispatch: Arc::new(BackgroundRunner::new(Arc::new(pipeline))),
        }
    }
}
