//! The media collaborator used by the pipeline and the orchestration services.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{info, instrument};

use neo_models::JsonObject;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::config::MediaConfig;
use crate::enhance::EnhancementPlan;
use crate::error::{MediaError, MediaResult};
use crate::fetch::{download_to, fetch_bytes, url_extension, validate_url};
use crate::frames::{grab_frame, sample_timestamps, scale_still};
use crate::probe::probe_video;
use crate::publish::publish_file;

/// A still extracted from a video.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    /// Seconds from the start of the video
    pub timestamp: f64,
    /// JPEG-encoded image
    pub jpeg: Vec<u8>,
}

/// A downloaded video. The file is removed when this is dropped.
#[derive(Debug)]
pub struct LocalVideo {
    dir: TempDir,
    path: PathBuf,
}

impl LocalVideo {
    /// Take ownership of `dir`; `file_name` is the video inside it.
    pub fn new(dir: TempDir, file_name: &str) -> Self {
        let path = dir.path().join(file_name);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Everything the service needs from media handling.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Download a video to local scratch space.
    async fn download_video(&self, url: &str) -> MediaResult<LocalVideo>;

    /// Technical metadata (duration, resolution, codecs, ...).
    async fn extract_metadata(&self, video: &Path) -> MediaResult<JsonObject>;

    /// `count` evenly spaced stills.
    async fn extract_frames(&self, video: &Path, count: usize) -> MediaResult<Vec<Frame>>;

    /// Raw bytes of a text, image or audio item.
    async fn fetch_content(&self, url: &str) -> MediaResult<Vec<u8>>;

    /// Render `frame` at `width` and publish it; returns the public URL.
    async fn render_thumbnail(&self, frame: &Frame, width: u32) -> MediaResult<String>;

    /// Apply `plan` to `video` and publish the result; returns the public URL.
    async fn apply_enhancements(&self, video: &Path, plan: &EnhancementPlan) -> MediaResult<String>;
}

/// `MediaBackend` over reqwest and the ffmpeg/ffprobe CLIs.
#[derive(Debug, Clone)]
pub struct FfmpegMedia {
    config: MediaConfig,
    http: reqwest::Client,
    runner: FfmpegRunner,
}

impl FfmpegMedia {
    pub fn new(config: MediaConfig) -> MediaResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let runner = FfmpegRunner::with_timeout(config.ffmpeg_timeout_secs);
        Ok(Self { config, http, runner })
    }

    pub fn from_env() -> MediaResult<Self> {
        Self::new(MediaConfig::from_env())
    }

    async fn scratch_dir(&self) -> MediaResult<TempDir> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        Ok(tempfile::Builder::new()
            .prefix("neo-")
            .tempdir_in(&self.config.work_dir)?)
    }
}

#[async_trait]
impl MediaBackend for FfmpegMedia {
    #[instrument(skip(self))]
    async fn download_video(&self, url: &str) -> MediaResult<LocalVideo> {
        let url = validate_url(url)?;
        let ext = url_extension(&url).unwrap_or_else(|| "mp4".to_string());
        let video = LocalVideo::new(self.scratch_dir().await?, &format!("source.{}", ext));

        download_to(&self.http, &url, video.path(), self.config.max_download_bytes).await?;
        Ok(video)
    }

    async fn extract_metadata(&self, video: &Path) -> MediaResult<JsonObject> {
        let info = probe_video(video).await?;
        match serde_json::to_value(info)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(MediaError::InvalidVideo(format!("unexpected probe shape: {}", other))),
        }
    }

    #[instrument(skip(self, video), fields(video = %video.display()))]
    async fn extract_frames(&self, video: &Path, count: usize) -> MediaResult<Vec<Frame>> {
        let info = probe_video(video).await?;
        let dir = self.scratch_dir().await?;

        let mut frames = Vec::with_capacity(count);
        for (index, timestamp) in sample_timestamps(info.duration, count).into_iter().enumerate() {
            let dest = dir.path().join(format!("frame_{:03}.jpg", index));
            grab_frame(&self.runner, video, timestamp, &dest).await?;
            frames.push(Frame {
                index,
                timestamp,
                jpeg: tokio::fs::read(&dest).await?,
            });
        }

        if frames.is_empty() {
            return Err(MediaError::InvalidVideo("no frames extracted".to_string()));
        }
        info!("Extracted {} frames from {}", frames.len(), video.display());
        Ok(frames)
    }

    async fn fetch_content(&self, url: &str) -> MediaResult<Vec<u8>> {
        let url = validate_url(url)?;
        fetch_bytes(&self.http, &url, self.config.max_download_bytes).await
    }

    async fn render_thumbnail(&self, frame: &Frame, width: u32) -> MediaResult<String> {
        let dir = self.scratch_dir().await?;
        let source = dir.path().join("frame.jpg");
        let scaled = dir.path().join("thumbnail.jpg");
        tokio::fs::write(&source, &frame.jpeg).await?;

        scale_still(&self.runner, &source, width, &scaled).await?;
        publish_file(&self.config, "thumbnails", "jpg", &scaled).await
    }

    #[instrument(skip(self, video, plan), fields(filters = %plan.filter_chain()))]
    async fn apply_enhancements(&self, video: &Path, plan: &EnhancementPlan) -> MediaResult<String> {
        let dir = self.scratch_dir().await?;
        let output = dir.path().join("enhanced.mp4");

        let cmd = FfmpegCommand::new(video, &output)
            .video_filter(plan.filter_chain())
            .video_codec("libx264")
            .crf(20)
            .preset("medium")
            .audio_codec("copy");
        self.runner.run(&cmd).await?;

        publish_file(&self.config, "enhanced", "mp4", &output).await
    }
}
