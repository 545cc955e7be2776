//! The six-engine model suite and its typed entry points.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::info;

use neo_models::{AnalysisResult, JsonObject, ModerationResult, Recommendation};

use crate::config::MlConfig;
use crate::engine::{InferenceEngine, InferenceInput, ModelRole};
use crate::error::{MlError, MlResult};
use crate::moderation::{max_per_label, parse_scores, result_from_scores};
use crate::remote::{build_http_client, RemoteEngine};

/// One engine per role.
#[derive(Clone)]
pub struct Engines {
    pub content: Arc<dyn InferenceEngine>,
    pub recommendation: Arc<dyn InferenceEngine>,
    pub toxicity: Arc<dyn InferenceEngine>,
    pub violence: Arc<dyn InferenceEngine>,
    pub image: Arc<dyn InferenceEngine>,
    pub speech: Arc<dyn InferenceEngine>,
}

/// Loaded inference engines, shared read-only by every request.
#[derive(Clone)]
pub struct ModelSuite {
    engines: Engines,
}

#[derive(Debug, Deserialize)]
struct RecommendationOutput {
    recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
struct FrameScores {
    scores: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Transcript {
    text: String,
}

fn into_object(output: serde_json::Value, what: &str) -> MlResult<JsonObject> {
    match output {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(MlError::invalid_output(format!(
            "{} output must be an object, got {}",
            what, other
        ))),
    }
}

fn parse_output<T: serde::de::DeserializeOwned>(output: serde_json::Value, what: &str) -> MlResult<T> {
    serde_json::from_value(output)
        .map_err(|e| MlError::invalid_output(format!("{} output: {}", what, e)))
}

async fn load_role(http: &reqwest::Client, config: &MlConfig, role: ModelRole) -> MlResult<RemoteEngine> {
    RemoteEngine::load(
        http.clone(),
        &config.service_url,
        role,
        config.models.get(role),
        &config.device,
    )
    .await
}

impl ModelSuite {
    /// Load all six models. Fails if any of them fails.
    pub async fn load(config: &MlConfig) -> MlResult<Self> {
        let http = build_http_client(config)?;

        let (content, recommendation, toxicity, violence, image, speech) = tokio::try_join!(
            load_role(&http, config, ModelRole::Content),
            load_role(&http, config, ModelRole::Recommendation),
            load_role(&http, config, ModelRole::Toxicity),
            load_role(&http, config, ModelRole::Violence),
            load_role(&http, config, ModelRole::Image),
            load_role(&http, config, ModelRole::Speech),
        )?;

        info!("Loaded {} models on {}", ModelRole::ALL.len(), config.device);

        Ok(Self::from_engines(Engines {
            content: Arc::new(content),
            recommendation: Arc::new(recommendation),
            toxicity: Arc::new(toxicity),
            violence: Arc::new(violence),
            image: Arc::new(image),
            speech: Arc::new(speech),
        }))
    }

    pub fn from_engines(engines: Engines) -> Self {
        Self { engines }
    }

    /// Content analysis of a downloaded video from its metadata and a few
    /// sampled frames.
    pub async fn analyze_content(&self, metadata: &JsonObject, frames: &[Vec<u8>]) -> MlResult<JsonObject> {
        let frames: Vec<String> = frames.iter().map(|f| BASE64_STANDARD.encode(f)).collect();
        let input = InferenceInput::Json(serde_json::json!({
            "task": "video_analysis",
            "metadata": metadata,
            "frames": frames,
        }));
        let output = self.engines.content.infer(input).await?;
        into_object(output, "content analysis")
    }

    /// Ranked recommendations for a user in the context of one video.
    pub async fn recommend(
        &self,
        user_id: &str,
        preferences: &JsonObject,
        context: &JsonObject,
    ) -> MlResult<Vec<Recommendation>> {
        let input = InferenceInput::Json(serde_json::json!({
            "user_id": user_id,
            "preferences": preferences,
            "context": context,
        }));
        let output = self.engines.recommendation.infer(input).await?;
        let parsed: RecommendationOutput = parse_output(output, "recommendation")?;
        Ok(parsed.recommendations)
    }

    pub async fn classify_toxicity(&self, text: &str) -> MlResult<ModerationResult> {
        let output = self
            .engines
            .toxicity
            .infer(InferenceInput::Text(text.to_string()))
            .await?;
        Ok(result_from_scores(parse_scores(&output)?))
    }

    /// Violence detection over one or more images; each label keeps its
    /// highest score across images.
    pub async fn detect_violence(&self, images: &[Vec<u8>]) -> MlResult<ModerationResult> {
        if images.is_empty() {
            return Err(MlError::InvalidInput("no images to classify".to_string()));
        }
        let mut sets = Vec::with_capacity(images.len());
        for image in images {
            let output = self
                .engines
                .violence
                .infer(InferenceInput::Image(image.clone()))
                .await?;
            sets.push(parse_scores(&output)?);
        }
        Ok(result_from_scores(max_per_label(sets)))
    }

    pub async fn transcribe(&self, audio: &[u8]) -> MlResult<String> {
        let output = self
            .engines
            .speech
            .infer(InferenceInput::Audio(audio.to_vec()))
            .await?;
        let transcript: Transcript = parse_output(output, "speech")?;
        Ok(transcript.text)
    }

    /// One visual-quality score per frame, in frame order.
    pub async fn score_frames(&self, frames: &[Vec<u8>]) -> MlResult<Vec<f64>> {
        let output = self
            .engines
            .image
            .infer(InferenceInput::Images(frames.to_vec()))
            .await?;
        let parsed: FrameScores = parse_output(output, "image")?;
        if parsed.scores.len() != frames.len() {
            return Err(MlError::invalid_output(format!(
                "expected {} frame scores, got {}",
                frames.len(),
                parsed.scores.len()
            )));
        }
        Ok(parsed.scores)
    }

    /// Aggregate summary of a creator's analyzed videos.
    pub async fn summarize_creator(&self, user_id: &str, analyses: &[AnalysisResult]) -> MlResult<JsonObject> {
        let input = InferenceInput::Json(serde_json::json!({
            "task": "creator_insights",
            "user_id": user_id,
            "analyses": analyses,
        }));
        let output = self.engines.content.infer(input).await?;
        into_object(output, "creator insights")
    }
}
