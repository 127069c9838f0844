use recommend_common::client::{normalize_base_url, ClientConfig};

use crate::error::AppError;

/// CLI configuration loaded from environment variables, with command-line overrides
/// applied on top.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP client settings, including the default backend base URL.
    pub client: ClientConfig,
}

impl Config {
    /// Optional:
    /// - `RECOMMEND_API_URL`: backend base URL (default "http://localhost:8000")
    /// - `RECOMMEND_MAX_ERROR_BODY_BYTES`: cap on error bodies kept for logging
    pub fn from_env() -> Result<Self, AppError> {
        let client = ClientConfig::from_env();
        validate_api_url(&client.base_url)?;
        Ok(Self { client })
    }

    /// Replace the configured base URL, e.g. from `--api-url`.
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Result<Self, AppError> {
        if let Some(url) = api_url {
            let url = normalize_base_url(url);
            validate_api_url(&url)?;
            self.client.base_url = url;
        }
        Ok(self)
    }

    pub fn api_url(&self) -> &str {
        &self.client.base_url
    }
}

pub fn validate_api_url(url: &str) -> Result<(), AppError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| AppError::Config(format!("invalid API URL {url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "unsupported API URL scheme {:?} in {url:?}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::Config(format!("API URL has no host: {url:?}")));
    }
    Ok(())
}
