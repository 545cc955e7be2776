//! Document index client.
//!
//! This crate provides:
//! - The [`DocumentIndex`] contract: id-based upsert, get by id,
//!   free-text query with term filters, liveness probe
//! - An Elasticsearch REST implementation with tracing spans and metrics
//! - An in-process implementation for tests and local runs

pub mod client;
pub mod error;
pub mod index;
pub mod memory;
pub mod metrics;

pub use client::{ElasticClient, SearchConfig};
pub use error::{SearchError, SearchResult};
pub use index::{DocumentIndex, DocumentIndexExt, SearchRequest};
pub use memory::MemoryIndex;
