//! Platform and action references.
//!
//! At rest a ref is an opaque JSON value keyed by `(post, platform)` (or, for
//! action refs, `(post, platform, action, user)`). Each adapter knows its own
//! shape statically through the typed values below.

use anyhow::{Context, Result};
use bluesky_client::StrongRef;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use super::{ActionKind, Platform};
use crate::common::{PostId, UserId};
use crate::kernel::BaseRefStore;

/// Typed shape of a platform's ref value.
pub trait RefShape: Serialize + DeserializeOwned + Send + Sync {
    const PLATFORM: Platform;
}

/// Twitter: `{id}` for a tweet, `{kind: "retweet", target_id}` for a retweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TwitterRef {
    Retweet { kind: RetweetKind, target_id: String },
    Tweet { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetweetKind {
    Retweet,
}

impl TwitterRef {
    pub fn tweet(id: impl Into<String>) -> Self {
        TwitterRef::Tweet { id: id.into() }
    }

    pub fn retweet(target_id: impl Into<String>) -> Self {
        TwitterRef::Retweet {
            kind: RetweetKind::Retweet,
            target_id: target_id.into(),
        }
    }

    /// The tweet that replies, quotes and engagement should point at.
    pub fn tweet_id(&self) -> &str {
        match self {
            TwitterRef::Tweet { id } => id,
            TwitterRef::Retweet { target_id, .. } => target_id,
        }
    }
}

impl RefShape for TwitterRef {
    const PLATFORM: Platform = Platform::Twitter;
}

/// Bluesky: the record's `{uri, cid}`, with `kind: "repost"` for reposts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueskyRef {
    pub uri: String,
    pub cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlueskyRefKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueskyRefKind {
    Repost,
}

impl BlueskyRef {
    pub fn post(created: StrongRef) -> Self {
        Self {
            uri: created.uri,
            cid: created.cid,
            kind: None,
        }
    }

    pub fn repost(created: StrongRef) -> Self {
        Self {
            uri: created.uri,
            cid: created.cid,
            kind: Some(BlueskyRefKind::Repost),
        }
    }

    pub fn is_repost(&self) -> bool {
        self.kind == Some(BlueskyRefKind::Repost)
    }

    pub fn strong_ref(&self) -> StrongRef {
        StrongRef {
            uri: self.uri.clone(),
            cid: self.cid.clone(),
        }
    }
}

impl RefShape for BlueskyRef {
    const PLATFORM: Platform = Platform::Bluesky;
}

/// Any platform's ref, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlatformRef {
    Twitter(TwitterRef),
    Bluesky(BlueskyRef),
}

impl From<TwitterRef> for PlatformRef {
    fn from(r: TwitterRef) -> Self {
        PlatformRef::Twitter(r)
    }
}

impl From<BlueskyRef> for PlatformRef {
    fn from(r: BlueskyRef) -> Self {
        PlatformRef::Bluesky(r)
    }
}

/// Key of an action ref: who did what to which post, on which platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionRefKey {
    pub post_id: PostId,
    pub platform: Platform,
    pub action: ActionKind,
    pub user_id: UserId,
}

// =============================================================================
// Typed access over the opaque store
// =============================================================================

pub async fn load_platform_ref<R: RefShape>(
    store: &dyn BaseRefStore,
    post_id: PostId,
) -> Result<Option<R>> {
    match store.get_platform_ref(post_id, R::PLATFORM).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .with_context(|| format!("malformed {} ref for post {}", R::PLATFORM, post_id)),
        None => Ok(None),
    }
}

pub async fn save_platform_ref<R: RefShape>(
    store: &dyn BaseRefStore,
    post_id: PostId,
    value: &R,
) -> Result<()> {
    store
        .set_platform_ref(post_id, R::PLATFORM, serde_json::to_value(value)?)
        .await
}

pub async fn load_action_ref<R: DeserializeOwned>(
    store: &dyn BaseRefStore,
    key: &ActionRefKey,
) -> Result<Option<R>> {
    match store.get_action_ref(key).await? {
        Some(value) => serde_json::from_value(value).map(Some).with_context(|| {
            format!(
                "malformed {} {} ref for post {}",
                key.platform, key.action, key.post_id
            )
        }),
        None => Ok(None),
    }
}

// =============================================================================
// SQL Queries - target: post_platform_refs, post_action_refs
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformRefRecord {
    pub post_id: PostId,
    pub platform: String,
    pub value: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl PlatformRefRecord {
    pub async fn find(post_id: PostId, platform: Platform, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT post_id, platform, value, created_at
             FROM post_platform_refs
             WHERE post_id = $1 AND platform = $2",
        )
        .bind(post_id)
        .bind(platform.as_str())
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert the ref unless one already exists; the first writer wins.
    pub async fn insert(
        post_id: PostId,
        platform: Platform,
        value: serde_json::Value,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO post_platform_refs (post_id, platform, value)
             VALUES ($1, $2, $3)
             ON CONFLICT (post_id, platform) DO NOTHING",
        )
        .bind(post_id)
        .bind(platform.as_str())
        .bind(Json(value))
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(post_id: PostId, platform: Platform, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM post_platform_refs WHERE post_id = $1 AND platform = $2")
            .bind(post_id)
            .bind(platform.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActionRefRecord {
    pub post_id: PostId,
    pub platform: String,
    pub action: String,
    pub user_id: UserId,
    pub value: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ActionRefRecord {
    pub async fn find(key: &ActionRefKey, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT post_id, platform, action, user_id, value, created_at
             FROM post_action_refs
             WHERE post_id = $1 AND platform = $2 AND action = $3 AND user_id = $4",
        )
        .bind(key.post_id)
        .bind(key.platform.as_str())
        .bind(key.action.as_str())
        .bind(key.user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn insert(key: &ActionRefKey, value: serde_json::Value, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO post_action_refs (post_id, platform, action, user_id, value)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (post_id, platform, action, user_id) DO NOTHING",
        )
        .bind(key.post_id)
        .bind(key.platform.as_str())
        .bind(key.action.as_str())
        .bind(key.user_id)
        .bind(Json(value))
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(key: &ActionRefKey, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "DELETE FROM post_action_refs
             WHERE post_id = $1 AND platform = $2 AND action = $3 AND user_id = $4",
        )
        .bind(key.post_id)
        .bind(key.platform.as_str())
        .bind(key.action.as_str())
        .bind(key.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_twitter_ref_shapes() {
        assert_eq!(serde_json::to_value(TwitterRef::tweet("100")).unwrap(), json!({"id": "100"}));
        assert_eq!(
            serde_json::to_value(TwitterRef::retweet("100")).unwrap(),
            json!({"kind": "retweet", "target_id": "100"})
        );

        let parsed: TwitterRef =
            serde_json::from_value(json!({"kind": "retweet", "target_id": "7"})).unwrap();
        assert_eq!(parsed, TwitterRef::retweet("7"));
        assert_eq!(parsed.tweet_id(), "7");

        let parsed: TwitterRef = serde_json::from_value(json!({"id": "8"})).unwrap();
        assert_eq!(parsed, TwitterRef::tweet("8"));
    }

    #[test]
    fn test_bluesky_ref_kind_is_optional() {
        let created = StrongRef {
            uri: "at://did:plc:a/app.bsky.feed.post/1".into(),
            cid: "bafy".into(),
        };
        assert_eq!(
            serde_json::to_value(BlueskyRef::post(created.clone())).unwrap(),
            json!({"uri": "at://did:plc:a/app.bsky.feed.post/1", "cid": "bafy"})
        );

        let repost = BlueskyRef::repost(created);
        assert!(repost.is_repost());
        assert_eq!(serde_json::to_value(&repost).unwrap()["kind"], "repost");
    }

    #[test]
    fn test_platform_ref_serializes_as_inner_shape() {
        let r: PlatformRef = TwitterRef::tweet("101").into();
        assert_eq!(serde_json::to_value(r).unwrap(), json!({"id": "101"}));
    }
}
