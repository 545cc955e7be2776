//! Inference engine contract.

use std::fmt;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::error::MlResult;

/// The six engine slots of the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    Content,
    Recommendation,
    Toxicity,
    Violence,
    Image,
    Speech,
}

impl ModelRole {
    pub const ALL: [ModelRole; 6] = [
        ModelRole::Content,
        ModelRole::Recommendation,
        ModelRole::Toxicity,
        ModelRole::Violence,
        ModelRole::Image,
        ModelRole::Speech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Content => "content",
            ModelRole::Recommendation => "recommendation",
            ModelRole::Toxicity => "toxicity",
            ModelRole::Violence => "violence",
            ModelRole::Image => "image",
            ModelRole::Speech => "speech",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of one inference call, by modality.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceInput {
    Text(String),
    /// Encoded image (JPEG/PNG)
    Image(Vec<u8>),
    /// Several encoded images scored as one batch
    Images(Vec<Vec<u8>>),
    /// Encoded audio
    Audio(Vec<u8>),
    Json(serde_json::Value),
}

impl InferenceInput {
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceInput::Text(_) => "text",
            InferenceInput::Image(_) => "image",
            InferenceInput::Images(_) => "images",
            InferenceInput::Audio(_) => "audio",
            InferenceInput::Json(_) => "json",
        }
    }

    /// JSON form sent to the model server. Binary payloads are base64.
    pub fn to_wire(&self) -> serde_json::Value {
        let data = match self {
            InferenceInput::Text(text) => serde_json::Value::String(text.clone()),
            InferenceInput::Image(bytes) | InferenceInput::Audio(bytes) => {
                serde_json::Value::String(BASE64_STANDARD.encode(bytes))
            }
            InferenceInput::Images(images) => serde_json::Value::Array(
                images
                    .iter()
                    .map(|bytes| serde_json::Value::String(BASE64_STANDARD.encode(bytes)))
                    .collect(),
            ),
            InferenceInput::Json(value) => value.clone(),
        };
        serde_json::json!({ "kind": self.kind(), "data": data })
    }
}

/// A loaded model. Immutable after load and callable concurrently.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Identifier of the loaded model.
    fn model_id(&self) -> &str;

    /// Run one inference and return the raw model output.
    async fn infer(&self, input: InferenceInput) -> MlResult<serde_json::Value>;
}
