//! Inference error types.

use thiserror::Error;

use crate::engine::ModelRole;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("Failed to load {role} model '{model}': {message}")]
    LoadFailed {
        role: ModelRole,
        model: String,
        message: String,
    },

    #[error("Inference failed ({0}): {1}")]
    InferenceFailed(u16, String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlError {
    pub fn invalid_output(msg: impl Into<String>) -> Self {
        Self::InvalidOutput(msg.into())
    }

    pub fn load_failed(role: ModelRole, model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            role,
            model: model.into(),
            message: message.into(),
        }
    }
}
