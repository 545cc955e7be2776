//! Elasticsearch REST API client.
//!
//! Plain HTTP/JSON against the document API:
//! - `PUT /{index}/_doc/{id}` for upserts
//! - `GET /{index}/_doc/{id}` for reads
//! - `POST /{index}/_search` for bool queries
//! - `HEAD /` as the liveness probe

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info_span, Instrument};

use neo_models::SearchHit;

use crate::error::{SearchError, SearchResult};
use crate::index::{DocumentIndex, SearchRequest};
use crate::metrics::record_request;

// =============================================================================
// Configuration
// =============================================================================

/// Elasticsearch client configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL, e.g. `http://elasticsearch:9200`
    pub url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://elasticsearch:9200".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl SearchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("ELASTICSEARCH_URL")
                .unwrap_or_else(|_| "http://elasticsearch:9200".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ELASTICSEARCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: serde_json::Value,
}

/// Build the `_search` body for a request. Blank text matches every
/// document, leaving only the filters to narrow it.
fn query_body(request: &SearchRequest) -> serde_json::Value {
    let filters: Vec<serde_json::Value> = request
        .filters
        .iter()
        .map(|(field, value)| serde_json::json!({ "term": { field: value } }))
        .collect();

    let text = if request.text.trim().is_empty() {
        serde_json::json!({ "match_all": {} })
    } else {
        serde_json::json!({
            "multi_match": {
                "query": request.text,
                "fields": ["*"],
                "lenient": true
            }
        })
    };

    serde_json::json!({
        "size": request.size,
        "query": {
            "bool": {
                "must": [text],
                "filter": filters
            }
        }
    })
}

// =============================================================================
// Client
// =============================================================================

/// Elasticsearch REST client. Cheap to clone; the HTTP pool is shared.
#[derive(Clone)]
pub struct ElasticClient {
    http: Client,
    base_url: String,
}

impl ElasticClient {
    /// Create a new client.
    pub fn new(config: SearchConfig) -> SearchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("neo-search/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SearchError::Network)?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> SearchResult<Self> {
        Self::new(SearchConfig::from_env())
    }

    fn document_url(&self, index: &str, id: &str) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.base_url,
            urlencoding::encode(index),
            urlencoding::encode(id)
        )
    }

    async fn execute_request<T, F>(&self, operation: &str, index: &str, fut: F) -> SearchResult<T>
    where
        F: std::future::Future<Output = SearchResult<T>>,
    {
        let span = info_span!("index_request", operation = %operation, index = %index);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: reqwest::Response) -> SearchError {
        let body = response.text().await.unwrap_or_default();
        SearchError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl DocumentIndex for ElasticClient {
    async fn ping(&self) -> SearchResult<()> {
        let url = format!("{}/", self.base_url);
        self.execute_request("ping", "_cluster", async {
            let response = self.http.head(&url).send().await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(SearchError::Unhealthy(format!(
                    "ping returned {}",
                    response.status()
                )))
            }
        })
        .await
    }

    async fn upsert(&self, index: &str, id: &str, document: &serde_json::Value) -> SearchResult<()> {
        let url = self.document_url(index, id);
        self.execute_request("upsert", index, async {
            let response = self.http.put(&url).json(document).send().await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => {
                    debug!("Indexed document {}/{}", index, id);
                    Ok(())
                }
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    async fn get(&self, index: &str, id: &str) -> SearchResult<Option<serde_json::Value>> {
        let url = self.document_url(index, id);
        self.execute_request("get", index, async {
            let response = self.http.get(&url).send().await?;
            match response.status() {
                StatusCode::OK => {
                    let doc: GetResponse = response.json().await?;
                    if doc.found {
                        doc.source
                            .map(Some)
                            .ok_or_else(|| SearchError::InvalidResponse(format!("{} has no _source", url)))
                    } else {
                        Ok(None)
                    }
                }
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<Vec<SearchHit>> {
        let url = format!("{}/{}/_search", self.base_url, urlencoding::encode(index));
        let body = query_body(request);

        self.execute_request("search", index, async {
            let response = self.http.post(&url).json(&body).send().await?;
            match response.status() {
                StatusCode::OK => {
                    let parsed: SearchResponse = response.json().await?;
                    Ok(parsed
                        .hits
                        .hits
                        .into_iter()
                        .map(|hit| SearchHit {
                            id: hit.id,
                            score: hit.score.unwrap_or(0.0),
                            source: hit.source,
                        })
                        .collect())
                }
                // Index not created yet: nothing has been analyzed.
                StatusCode::NOT_FOUND => Ok(Vec::new()),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ElasticClient {
        ElasticClient::new(SearchConfig {
            url: server.uri(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    #[serial]
    fn config_from_env_default_url() {
        std::env::remove_var("ELASTICSEARCH_URL");
        let config = SearchConfig::from_env();
        assert_eq!(config.url, "http://elasticsearch:9200");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn query_body_includes_filters() {
        let request = SearchRequest::new("cats").with_filter("user_id", json!("u1")).with_size(5);
        let body = query_body(&request);
        assert_eq!(body["size"], 5);
        assert_eq!(body["query"]["bool"]["must"][0]["multi_match"]["query"], "cats");
        assert_eq!(body["query"]["bool"]["filter"][0]["term"]["user_id"], "u1");
    }

    #[tokio::test]
    async fn ping_succeeds_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        client_for(&server).ping().await.expect("ping");
    }

    #[tokio::test]
    async fn ping_fails_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).ping().await,
            Err(SearchError::Unhealthy(_))
        ));
    }

    #[tokio::test]
    async fn upsert_puts_document_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/video_analysis/_doc/v1"))
            .and(body_partial_json(json!({"video_id": "v1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .upsert("video_analysis", "v1", &json!({"video_id": "v1"}))
            .await
            .expect("upsert");
    }

    #[tokio::test]
    async fn get_missing_document_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video_analysis/_doc/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"found": false})))
            .mount(&server)
            .await;

        let doc = client_for(&server).get("video_analysis", "nope").await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn get_returns_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video_analysis/_doc/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "v1",
                "found": true,
                "_source": {"video_id": "v1"}
            })))
            .mount(&server)
            .await;

        let doc = client_for(&server).get("video_analysis", "v1").await.unwrap();
        assert_eq!(doc, Some(json!({"video_id": "v1"})));
    }

    #[tokio::test]
    async fn search_parses_hits_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video_analysis/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {"hits": [
                    {"_id": "a", "_score": 2.5, "_source": {"title": "a"}},
                    {"_id": "b", "_score": 1.0, "_source": {"title": "b"}}
                ]}
            })))
            .mount(&server)
            .await;

        let hits = client_for(&server)
            .search("video_analysis", &SearchRequest::new("title"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].score, 2.5);
    }

    #[tokio::test]
    async fn blank_search_matches_all_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video_analysis/_search"))
            .and(body_partial_json(json!({
                "query": {"bool": {
                    "must": [{"match_all": {}}],
                    "filter": [{"term": {"user_id": "u1"}}]
                }}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {"hits": [{"_id": "a", "_score": 1.0, "_source": {"user_id": "u1"}}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = SearchRequest::new("  ").with_filter("user_id", json!("u1"));
        let hits = client_for(&server).search("video_analysis", &request).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn search_server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video_analysis/_search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search("video_analysis", &SearchRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::ServerError(500, _)));
    }
}
