//! Frame sampling and thumbnail rendering.

use std::path::Path;

use serde_json::Value;

use neo_models::JsonObject;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 480;
pub const DEFAULT_FRAME_COUNT: usize = 8;
pub const MAX_FRAME_COUNT: usize = 32;
const MAX_THUMBNAIL_WIDTH: u32 = 3840;

/// Parsed `options` of a thumbnail request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    /// Output width in pixels; height keeps the aspect ratio
    pub width: u32,
    /// Candidate frames to sample and score
    pub frame_count: usize,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_THUMBNAIL_WIDTH,
            frame_count: DEFAULT_FRAME_COUNT,
        }
    }
}

fn positive_int(options: &JsonObject, key: &str, max: u64) -> MediaResult<Option<u64>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .filter(|n| (1..=max).contains(n))
            .map(Some)
            .ok_or_else(|| {
                MediaError::invalid_options(format!("`{}` must be an integer between 1 and {}", key, max))
            }),
    }
}

impl ThumbnailOptions {
    /// Unknown keys are ignored; known keys must be in range.
    pub fn from_options(options: Option<&JsonObject>) -> MediaResult<Self> {
        let Some(options) = options else {
            return Ok(Self::default());
        };
        let defaults = Self::default();
        Ok(Self {
            width: positive_int(options, "width", MAX_THUMBNAIL_WIDTH as u64)?
                .map(|w| w as u32)
                .unwrap_or(defaults.width),
            frame_count: positive_int(options, "frame_count", MAX_FRAME_COUNT as u64)?
                .map(|n| n as usize)
                .unwrap_or(defaults.frame_count),
        })
    }
}

/// `count` timestamps at the centres of equal slices of the video.
pub fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if !duration.is_finite() || duration <= 0.0 {
        return vec![0.0];
    }
    let step = duration / count as f64;
    (0..count).map(|i| (i as f64 + 0.5) * step).collect()
}

/// Grab one JPEG still at `timestamp`.
pub async fn grab_frame(runner: &FfmpegRunner, video: &Path, timestamp: f64, dest: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video, dest)
        .seek(timestamp)
        .single_frame()
        .jpeg_quality(2);
    runner.run(&cmd).await
}

/// Scale a still to `width`, preserving aspect ratio.
pub async fn scale_still(runner: &FfmpegRunner, source: &Path, width: u32, dest: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(source, dest)
        .single_frame()
        .video_filter(format!("scale={}:-2", width))
        .jpeg_quality(3);
    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_when_absent() {
        assert_eq!(ThumbnailOptions::from_options(None).unwrap(), ThumbnailOptions::default());
        let empty = JsonObject::new();
        assert_eq!(
            ThumbnailOptions::from_options(Some(&empty)).unwrap().width,
            DEFAULT_THUMBNAIL_WIDTH
        );
    }

    #[test]
    fn options_parse_and_validate() {
        let opts = json!({"width": 1280, "frame_count": 4, "style": "ignored"});
        let parsed = ThumbnailOptions::from_options(opts.as_object()).unwrap();
        assert_eq!(parsed, ThumbnailOptions { width: 1280, frame_count: 4 });

        let bad = json!({"frame_count": 0});
        assert!(ThumbnailOptions::from_options(bad.as_object()).is_err());
        let bad = json!({"width": "wide"});
        assert!(ThumbnailOptions::from_options(bad.as_object()).is_err());
    }

    #[test]
    fn timestamps_are_slice_centres() {
        assert_eq!(sample_timestamps(8.0, 4), vec![1.0, 3.0, 5.0, 7.0]);
        assert_eq!(sample_timestamps(0.0, 4), vec![0.0]);
        assert!(sample_timestamps(10.0, 0).is_empty());
    }
}
