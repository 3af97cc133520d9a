//! Upstream image fetching

use crate::error::{PreviewError, Result};
use reqwest::header::{HeaderMap, HOST};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for fetching source images from their origin servers
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    /// Create a fetcher with the given connect and total request timeouts.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch the image at `url`, forwarding the caller's request headers.
    ///
    /// The `Host` header is dropped so the client can set its own for the
    /// upstream origin. Any non-2xx response is an upstream error.
    pub async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>> {
        let mut forward = headers.clone();
        forward.remove(HOST);

        debug!(url = %url, "Fetching source image");
        let response = self.client.get(url).headers(forward).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Upstream rejected image fetch");
            return Err(PreviewError::Upstream(format!(
                "upstream returned status {}",
                response.status()
            )));
        }

        let data = response.bytes().await?.to_vec();
        debug!(url = %url, size = data.len(), "Fetched source image");
        Ok(data)
    }
}
