//! Media configuration.

use std::path::PathBuf;

/// Media backend configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Scratch space for downloads and intermediate files
    pub work_dir: PathBuf,
    /// Where published thumbnails and enhanced videos are written
    pub output_dir: PathBuf,
    /// Public URL prefix that serves `output_dir`
    pub public_base_url: String,
    /// Upper bound for a single download or fetch
    pub max_download_bytes: u64,
    /// FFmpeg process timeout
    pub ffmpeg_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/neovideo"),
            output_dir: PathBuf::from("/var/lib/neovideo/media"),
            public_base_url: "http://localhost:5000/media".to_string(),
            max_download_bytes: 2 * 1024 * 1024 * 1024,
            ffmpeg_timeout_secs: 1800,
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("MEDIA_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("MEDIA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            public_base_url: std::env::var("MEDIA_PUBLIC_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            max_download_bytes: std::env::var("MEDIA_MAX_DOWNLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_download_bytes),
            ffmpeg_timeout_secs: std::env::var("MEDIA_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ffmpeg_timeout_secs),
        }
    }
}
