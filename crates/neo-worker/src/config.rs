//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent queue jobs
    pub max_concurrent_jobs: usize,
    /// Frames sampled from each video for content analysis
    pub analysis_frames: usize,
    /// Upper bound for one analysis attempt
    pub job_timeout: Duration,
    /// How long to wait for in-flight jobs on shutdown
    pub shutdown_timeout: Duration,
    /// How often the worker scans for orphaned pending jobs
    pub claim_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            analysis_frames: 4,
            job_timeout: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(60),
            claim_interval: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            analysis_frames: std::env::var("WORKER_ANALYSIS_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.analysis_frames),
            job_timeout: std::env::var("WORKER_JOB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_timeout),
            shutdown_timeout: std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            claim_interval: std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn zero_concurrency_falls_back_to_default() {
        std::env::set_var("WORKER_MAX_JOBS", "0");
        assert_eq!(WorkerConfig::from_env().max_concurrent_jobs, 2);
        std::env::set_var("WORKER_MAX_JOBS", "6");
        assert_eq!(WorkerConfig::from_env().max_concurrent_jobs, 6);
        std::env::remove_var("WORKER_MAX_JOBS");
    }

    #[test]
    #[serial]
    fn timeouts_are_seconds() {
        std::env::set_var("WORKER_JOB_TIMEOUT", "90");
        assert_eq!(WorkerConfig::from_env().job_timeout, Duration::from_secs(90));
        std::env::remove_var("WORKER_JOB_TIMEOUT");
    }
}
