//! Model inference configuration.

use std::time::Duration;

use crate::engine::ModelRole;

/// Model identifiers per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIds {
    pub content: String,
    pub recommendation: String,
    pub toxicity: String,
    pub violence: String,
    pub image: String,
    pub speech: String,
}

impl Default for ModelIds {
    fn default() -> Self {
        Self {
            content: "bert-base-uncased".to_string(),
            recommendation: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            toxicity: "unitary/toxic-bert".to_string(),
            violence: "fasterrcnn_resnet50_fpn".to_string(),
            image: "openai/clip-vit-base-patch32".to_string(),
            speech: "facebook/wav2vec2-base-960h".to_string(),
        }
    }
}

impl ModelIds {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);
        Self {
            content: var("MODEL_CONTENT", defaults.content),
            recommendation: var("MODEL_RECOMMENDATION", defaults.recommendation),
            toxicity: var("MODEL_TOXICITY", defaults.toxicity),
            violence: var("MODEL_VIOLENCE", defaults.violence),
            image: var("MODEL_IMAGE", defaults.image),
            speech: var("MODEL_SPEECH", defaults.speech),
        }
    }

    pub fn get(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Content => &self.content,
            ModelRole::Recommendation => &self.recommendation,
            ModelRole::Toxicity => &self.toxicity,
            ModelRole::Violence => &self.violence,
            ModelRole::Image => &self.image,
            ModelRole::Speech => &self.speech,
        }
    }
}

/// Model-serving client configuration.
#[derive(Debug, Clone)]
pub struct MlConfig {
    /// Base URL of the model server
    pub service_url: String,
    /// Device requested when loading (`cpu`, `cuda`)
    pub device: String,
    /// Per-request timeout; loading a model can take a while
    pub timeout: Duration,
    pub models: ModelIds,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8001".to_string(),
            device: "cpu".to_string(),
            timeout: Duration::from_secs(120),
            models: ModelIds::default(),
        }
    }
}

impl MlConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            service_url: std::env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            device: std::env::var("ML_DEVICE").unwrap_or_else(|_| "cpu".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ML_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            models: ModelIds::from_env(),
        }
    }
}
