//! Engine backed by a model-serving HTTP endpoint.
//!
//! - `POST /models/{model}/load` with `{"device": ...}` loads the model
//! - `POST /models/{model}/infer` with `{"inputs": {"kind", "data"}}` runs it;
//!   the response body is `{"outputs": ...}`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, info_span, Instrument};

use crate::config::MlConfig;
use crate::engine::{InferenceEngine, InferenceInput, ModelRole};
use crate::error::{MlError, MlResult};
use crate::metrics::record_inference;

#[derive(Debug, Deserialize)]
struct InferResponse {
    outputs: serde_json::Value,
}

/// Shared HTTP client for all engines of one suite.
pub fn build_http_client(config: &MlConfig) -> MlResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(16)
        .user_agent(concat!("neo-ml/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(MlError::Network)
}

/// A model loaded on the model server.
#[derive(Clone)]
pub struct RemoteEngine {
    http: Client,
    role: ModelRole,
    model_id: String,
    infer_url: String,
}

impl RemoteEngine {
    /// Ask the server to load `model_id` and return a handle to it.
    pub async fn load(
        http: Client,
        base_url: &str,
        role: ModelRole,
        model_id: &str,
        device: &str,
    ) -> MlResult<Self> {
        let model_url = format!(
            "{}/models/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(model_id)
        );

        info!(role = %role, model = %model_id, device = %device, "Loading model");

        let response = http
            .post(format!("{}/load", model_url))
            .json(&serde_json::json!({ "device": device }))
            .send()
            .await
            .map_err(|e| MlError::load_failed(role, model_id, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::load_failed(
                role,
                model_id,
                format!("server returned {}: {}", status, body),
            ));
        }

        Ok(Self {
            http,
            role,
            model_id: model_id.to_string(),
            infer_url: format!("{}/infer", model_url),
        })
    }

    pub fn role(&self) -> ModelRole {
        self.role
    }

    async fn call(&self, input: InferenceInput) -> MlResult<serde_json::Value> {
        let body = serde_json::json!({ "inputs": input.to_wire() });
        let response = self.http.post(&self.infer_url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::InferenceFailed(status.as_u16(), body));
        }

        let parsed: InferResponse = response.json().await?;
        Ok(parsed.outputs)
    }
}

#[async_trait]
impl InferenceEngine for RemoteEngine {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn infer(&self, input: InferenceInput) -> MlResult<serde_json::Value> {
        let span = info_span!(
            "inference",
            role = %self.role,
            model = %self.model_id,
            kind = input.kind()
        );

        let start = Instant::now();
        let result = self.call(input).instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;
        record_inference(self.role.as_str(), result.is_ok(), latency_ms);

        debug!(role = %self.role, latency_ms, ok = result.is_ok(), "Inference finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> Client {
        build_http_client(&MlConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn load_encodes_model_id_and_sends_device() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/unitary%2Ftoxic-bert/load"))
            .and(body_partial_json(json!({"device": "cpu"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"loaded": true})))
            .expect(1)
            .mount(&server)
            .await;

        let engine = RemoteEngine::load(http(), &server.uri(), ModelRole::Toxicity, "unitary/toxic-bert", "cpu")
            .await
            .expect("load");
        assert_eq!(engine.model_id(), "unitary/toxic-bert");
        assert_eq!(engine.role(), ModelRole::Toxicity);
    }

    #[tokio::test]
    async fn load_failure_names_the_role() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("out of memory"))
            .mount(&server)
            .await;

        let err = RemoteEngine::load(http(), &server.uri(), ModelRole::Speech, "w2v", "cpu")
            .await
            .err()
            .expect("load must fail");
        assert!(matches!(err, MlError::LoadFailed { role: ModelRole::Speech, .. }));
        assert!(err.to_string().contains("out of memory"));
    }

    #[tokio::test]
    async fn infer_returns_outputs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/bert/load"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/bert/infer"))
            .and(body_partial_json(json!({"inputs": {"kind": "text", "data": "hello"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"outputs": {"label": "ok"}})))
            .mount(&server)
            .await;

        let engine = RemoteEngine::load(http(), &server.uri(), ModelRole::Content, "bert", "cpu")
            .await
            .unwrap();
        let out = engine.infer(InferenceInput::Text("hello".into())).await.unwrap();
        assert_eq!(out, json!({"label": "ok"}));
    }

    #[tokio::test]
    async fn infer_error_status_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/bert/load"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/bert/infer"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad input"))
            .mount(&server)
            .await;

        let engine = RemoteEngine::load(http(), &server.uri(), ModelRole::Content, "bert", "cpu")
            .await
            .unwrap();
        let err = engine.infer(InferenceInput::Text("x".into())).await.unwrap_err();
        assert!(matches!(err, MlError::InferenceFailed(422, _)));
    }
}
