use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Public base URL of the home platform, used to link embedded posts,
    /// users, projects and lists.
    pub home_base_url: String,
    /// Base URL of the content-addressed asset store.
    pub asset_base_url: String,
    pub twitter_api_base_url: String,
    pub bluesky_service_url: String,
    /// Per-request timeout for platform API calls.
    pub platform_http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let timeout_secs: u64 = env::var("PLATFORM_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("PLATFORM_HTTP_TIMEOUT_SECS must be a valid number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            home_base_url: env::var("HOME_BASE_URL").context("HOME_BASE_URL must be set")?,
            asset_base_url: env::var("ASSET_BASE_URL").context("ASSET_BASE_URL must be set")?,
            twitter_api_base_url: env::var("TWITTER_API_BASE_URL")
                .unwrap_or_else(|_| twitter_client::DEFAULT_BASE_URL.to_string()),
            bluesky_service_url: env::var("BLUESKY_SERVICE_URL")
                .unwrap_or_else(|_| bluesky_client::DEFAULT_SERVICE_URL.to_string()),
            platform_http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
