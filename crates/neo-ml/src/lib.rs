//! Model inference facade.
//!
//! Six engines (content, recommendation, toxicity, violence, image, speech)
//! are loaded once at startup by [`ModelSuite::load`] and then shared
//! read-only. Loading is all-or-nothing.
//!
//! Each engine sits behind [`InferenceEngine`]; [`RemoteEngine`] drives a
//! model-serving HTTP endpoint, tests plug in their own engines through
//! [`ModelSuite::from_engines`].

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod moderation;
pub mod remote;
pub mod suite;

pub use config::{MlConfig, ModelIds};
pub use engine::{InferenceEngine, InferenceInput, ModelRole};
pub use error::{MlError, MlResult};
pub use remote::RemoteEngine;
pub use suite::{Engines, ModelSuite};
