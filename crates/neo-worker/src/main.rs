//! Analysis worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use neo_cache::RedisCache;
use neo_media::FfmpegMedia;
use neo_ml::{MlConfig, ModelSuite};
use neo_queue::{JobQueue, QueueConfig};
use neo_search::ElasticClient;
use neo_worker::{AnalysisPipeline, JobExecutor, WorkerConfig};

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("neo=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

fn exit_on_err<T, E: std::fmt::Display>(what: &str, result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to {}: {}", what, e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    // TLS for reqwest and redis (rustls)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting neo-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let cache = exit_on_err("create Redis cache", RedisCache::from_env());
    let index = exit_on_err("create Elasticsearch client", ElasticClient::from_env());
    let media = exit_on_err("create media backend", FfmpegMedia::from_env());
    let queue = exit_on_err(
        "create job queue",
        JobQueue::new(QueueConfig::from_env().covering(config.job_timeout)),
    );
    let models = exit_on_err("load models", ModelSuite::load(&MlConfig::from_env()).await);

    let pipeline = Arc::new(AnalysisPipeline::new(
        Arc::new(cache),
        Arc::new(index),
        Arc::new(models),
        Arc::new(media),
        &config,
    ));
    let executor = Arc::new(JobExecutor::new(config, queue, pipeline));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
