//! Key-value cache client.
//!
//! This crate provides:
//! - The [`CacheStore`] contract: string values with optional expiry,
//!   hash fields, capped lists and a liveness probe
//! - A Redis implementation opening a connection per operation
//! - An in-process implementation with the same expiry semantics

pub mod error;
pub mod memory;
pub mod redis_cache;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use redis_cache::{CacheConfig, RedisCache};
pub use store::{CacheStore, CacheStoreExt};
