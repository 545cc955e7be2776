//! Media collaborator.
//!
//! This crate provides:
//! - [`MediaBackend`]: download, metadata, frame extraction, content fetch,
//!   thumbnail rendering and enhancement
//! - [`FfmpegMedia`]: reqwest for HTTP(S) fetches, ffprobe/ffmpeg CLIs for
//!   everything else
//! - Enhancement and thumbnail option parsing, validated before any work
//! - Content-addressed publishing of generated files

pub mod backend;
pub mod command;
pub mod config;
pub mod enhance;
pub mod error;
pub mod fetch;
pub mod frames;
pub mod probe;
pub mod publish;

pub use backend::{FfmpegMedia, Frame, LocalVideo, MediaBackend};
pub use config::MediaConfig;
pub use enhance::EnhancementPlan;
pub use error::{MediaError, MediaResult};
pub use frames::ThumbnailOptions;
