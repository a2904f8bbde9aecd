use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::{BaseMediaFetcher, FetchedMedia};

/// Fetches asset bytes over HTTP for re-upload to a platform.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BaseMediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia> {
        // Status errors stay reqwest::Error so 5xx from the asset host classify as retryable
        let response = self.client.get(url).send().await?.error_for_status()?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = response.bytes().await?;
        tracing::debug!(url = %url, size = bytes.len(), mime_type = %mime_type, "Fetched media");

        Ok(FetchedMedia {
            bytes: bytes.to_vec(),
            mime_type,
        })
    }
}
