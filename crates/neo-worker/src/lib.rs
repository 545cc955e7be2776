//! Background analysis jobs.
//!
//! This crate provides:
//! - [`AnalysisPipeline`]: the single job body (download, probe, analyse, persist)
//! - Two submission adapters behind [`AnalysisDispatch`]: the in-process
//!   [`BackgroundRunner`] and the durable [`QueueDispatch`]
//! - [`JobExecutor`]: the stream consumer run by the `neo-worker` binary
//! - Structured job logging

pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;

pub use config::WorkerConfig;
pub use dispatch::{AnalysisDispatch, BackgroundRunner, QueueDispatch};
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use pipeline::{read_status, write_status, AnalysisPipeline};
