use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use super::Platform;
use crate::common::UserId;

/// Current token state for one user on one platform.
///
/// On Bluesky `access_token`/`refresh_token` hold the session JWTs and
/// `account_id` the DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

impl PlatformTokens {
    /// True when the access token is expired or expires within `margin`.
    /// Tokens without a known expiry are treated as valid.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at
            .map(|expires_at| expires_at <= now + margin)
            .unwrap_or(false)
    }
}

/// OAuth2 app registration for Twitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterAppConfig {
    pub client_id: String,
    pub client_secret: String,
}

/// Login material for Bluesky.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyAppConfig {
    /// Handle or email.
    pub identifier: String,
    /// App password; without it an expired refresh token cannot be recovered.
    #[serde(default)]
    pub app_password: Option<String>,
}

// =============================================================================
// SQL Queries - target: platform_credentials
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformCredential {
    pub user_id: UserId,
    pub platform: String,
    pub app_config: Option<Json<serde_json::Value>>,
    pub tokens: Option<Json<PlatformTokens>>,
    pub updated_at: DateTime<Utc>,
}

impl PlatformCredential {
    pub async fn find(user_id: UserId, platform: Platform, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT user_id, platform, app_config, tokens, updated_at
             FROM platform_credentials
             WHERE user_id = $1 AND platform = $2",
        )
        .bind(user_id)
        .bind(platform.as_str())
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Overwrite the token state. Concurrent refreshes for the same user are
    /// last-writer-wins.
    pub async fn save_tokens(
        user_id: UserId,
        platform: Platform,
        tokens: &PlatformTokens,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO platform_credentials (user_id, platform, tokens, updated_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (user_id, platform)
             DO UPDATE SET tokens = EXCLUDED.tokens, updated_at = now()",
        )
        .bind(user_id)
        .bind(platform.as_str())
        .bind(Json(tokens))
        .execute(pool)
        .await?;
        Ok(())
    }
}
