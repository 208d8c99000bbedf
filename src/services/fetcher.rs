//! Raw media download.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Failure to fetch one resource.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl FetchError {
    /// Short class name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "Http",
            Self::Status(_) => "Status",
        }
    }
}

/// Fetches the bytes behind a resource locator.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, locator: &str, identity: &str) -> Result<Vec<u8>, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str, identity: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(locator)
            .header(USER_AGENT, identity)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
