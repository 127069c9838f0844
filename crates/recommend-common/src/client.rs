use std::future::Future;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::model::{HealthResponse, RecommendEnvelope, RecommendRequest, RecommendResponse};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash, e.g. "http://localhost:8000".
    pub base_url: String,
    pub max_error_body_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            max_error_body_bytes: 8 * 1024,
        }
    }
}

impl ClientConfig {
    /// Optional:
    /// - `RECOMMEND_API_URL` (default: "http://localhost:8000")
    /// - `RECOMMEND_MAX_ERROR_BODY_BYTES` (default: 8192)
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("RECOMMEND_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let max_error_body_bytes = std::env::var("RECOMMEND_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8 * 1024);

        Self {
            base_url: normalize_base_url(&base_url),
            max_error_body_bytes,
        }
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("recommendation service returned error: status={status} body={body}")]
    Api { status: StatusCode, body: String },

    #[error("recommendation service returned an unreadable body: status={status} error={message}")]
    InvalidBody { status: StatusCode, message: String },
}

/// Anything that can turn a query into ranked recommendations.
///
/// The query panel and the evaluator are written against this trait; production code
/// uses [`RecommendClient`].
pub trait RecommendationSource: Send + Sync + 'static {
    fn recommend(
        &self,
        base_url: &str,
        query: &str,
    ) -> impl Future<Output = Result<RecommendResponse, ClientError>> + Send;
}

#[derive(Clone)]
pub struct RecommendClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl RecommendClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("recommend-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET {base_url}/health`.
    pub async fn health(&self, base_url: &str) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", normalize_base_url(base_url));
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.to_api_error(resp).await);
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidBody {
            status,
            message: e.to_string(),
        })
    }

    async fn to_api_error(&self, resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
        ClientError::Api { status, body }
    }
}

impl RecommendationSource for RecommendClient {
    /// `POST {base_url}/recommend` with `{"query": ...}`.
    ///
    /// A success status whose body lacks a `recommendations` array yields an empty list;
    /// deciding what an empty list means is left to the caller.
    async fn recommend(
        &self,
        base_url: &str,
        query: &str,
    ) -> Result<RecommendResponse, ClientError> {
        let url = format!("{}/recommend", normalize_base_url(base_url));
        debug!(url = %url, query_len = query.len(), "sending recommendation request");

        let resp = self
            .http
            .post(&url)
            .json(&RecommendRequest { query })
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, url = %url, "recommendation request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let err = self.to_api_error(resp).await;
            warn!(status = status.as_u16(), "recommendation service returned error status");
            return Err(err);
        }

        let body = resp.bytes().await?;
        let envelope: RecommendEnvelope =
            serde_json::from_slice(&body).map_err(|e| ClientError::InvalidBody {
                status,
                message: e.to_string(),
            })?;
        let response = envelope.normalize();
        debug!(
            count = response.recommendations.len(),
            processing_time = ?response.processing_time,
            "recommendation response decoded"
        );
        Ok(response)
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read error body");
            "<failed to read error body>".to_string()
        }
    }
}
