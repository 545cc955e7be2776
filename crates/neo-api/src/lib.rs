//! HTTP API for the video AI service.
//!
//! Every feature endpoint is a thin handler over a function in [`services`];
//! the services talk to the cache, the document index, the model suite and
//! the media backend held in [`AppContext`].

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, CacheBackend, DispatchMode};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppContext;
