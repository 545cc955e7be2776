//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams with idempotency keys
//! - Consumer-group reads for `neo-worker`
//! - Retry counters, a dead-letter stream and pending-claim for crashed workers

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{AnalyzeVideoJob, QueueJob};
pub use queue::{JobQueue, QueueConfig};
