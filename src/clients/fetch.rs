//! Image-download collaborator.
//!
//! Fetches the image behind a work item's URL into scratch storage. No
//! retry layer: a failed download fails the invocation and redelivery is
//! the queue's concern.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;

/// Download a URL to a local path.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}

/// Plain HTTP GET fetcher.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        tokio::fs::write(destination, &bytes).await?;
        debug!(url, bytes = bytes.len(), "Downloaded image");
        Ok(())
    }
}
