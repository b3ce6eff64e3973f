pub mod cache;
pub mod paginate;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use cache::FetchCache;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub token not found, set GITHUB_TOKEN or [github] token")]
    MissingToken,

    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected response for {path}: expected {expected}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
    },

    #[error("Cache directory {} is not accessible: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not a directory: {}", path.display())]
    CacheNotADirectory { path: PathBuf },

    #[error("Failed to read cache file {}: {source}", path.display())]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode cache file {}: {source}", path.display())]
    CacheDecode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode response for cache file {}: {source}", path.display())]
    CacheEncode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write cache file {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApiError {
    /// True when the server answered 404 Not Found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// A single live GET against the API, returning the decoded JSON body.
///
/// `path` is the request path relative to the API root, including any
/// query string (e.g. `/repos/org/repo/pulls?state=closed`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;
}

/// Authenticated reqwest-backed transport for the GitHub REST API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    /// Build a transport from configuration.
    ///
    /// Fails with `ApiError::MissingToken` when no non-blank token is
    /// configured, before any request can be made.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let token = config
            .github_token()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingToken)?
            .to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.api_url().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        info!("Fetching {url} ...");

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, "gh-stats")
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.json::<Value>().await?;
        debug!(url = %url, "received response");
        Ok(body)
    }
}
