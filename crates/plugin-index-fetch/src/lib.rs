//! HTTP fetching for the plugin index.
//!
//! Sources talk to the network through the [`HttpFetch`] trait so that they
//! can be driven by [`MemoryFetcher`] in tests. A missing resource is
//! reported as [`FetchError::NotFound`], separately from transport failures.

mod memory;

pub use memory::MemoryFetcher;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("plugin-index/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl FetchError {
    /// Returns true if the resource does not exist, as opposed to a failed request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Fetch the body of a URL.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch the raw body at `url`.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Fetch the body at `url` as UTF-8 text, replacing invalid sequences.
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Fetch `url` and decode it as JSON.
pub async fn get_json<T: DeserializeOwned>(
    fetcher: &dyn HttpFetch,
    url: &str,
) -> Result<T, FetchError> {
    let bytes = fetcher.get_bytes(url).await?;
    serde_json::from_slice(&bytes).map_err(|source| FetchError::Json {
        url: url.to_string(),
        source,
    })
}

/// [`HttpFetch`] over a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for HttpFetcher {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        debug!("GET {}", parsed);
        let resp = self.client.get(parsed).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}
