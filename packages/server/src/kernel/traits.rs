// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Sync decisions (idempotency, skips, classification) live in
// domains::crosspost::activities and use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseRefStore, BaseTwitterApi)

use anyhow::Result;
use async_trait::async_trait;
use bluesky_client::{Session, StrongRef};
use serde_json::Value;
use twitter_client::{CreateTweetRequest, OAuthToken, Tweet, User};

use crate::common::{ListId, PostId, ProjectId, UserId};
use crate::domains::crosspost::models::{
    ActionRefKey, Embed, EntitySummary, Platform, Post, PlatformTokens, SyncAuditEntry, SyncEvent,
    SyncSettings, TwitterAppConfig,
};

// =============================================================================
// Home Read Models (owned by the posts, users, projects and lists services)
// =============================================================================

#[async_trait]
pub trait BasePostReader: Send + Sync {
    /// Load a post with its embed and ordered media, soft-deleted or not.
    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>>;
}

/// Users, projects and lists, for link cards.
#[async_trait]
pub trait BaseEntityReader: Send + Sync {
    async fn get_user(&self, user_id: UserId) -> Result<Option<EntitySummary>>;

    async fn get_project(&self, project_id: ProjectId) -> Result<Option<EntitySummary>>;

    async fn get_list(&self, list_id: ListId) -> Result<Option<EntitySummary>>;
}

// =============================================================================
// Reference Store (opaque key/value)
// =============================================================================

#[async_trait]
pub trait BaseRefStore: Send + Sync {
    async fn get_platform_ref(&self, post_id: PostId, platform: Platform) -> Result<Option<Value>>;

    /// Keeps an existing ref; a post has at most one per platform.
    async fn set_platform_ref(&self, post_id: PostId, platform: Platform, value: Value)
        -> Result<()>;

    async fn delete_platform_ref(&self, post_id: PostId, platform: Platform) -> Result<()>;

    async fn get_action_ref(&self, key: &ActionRefKey) -> Result<Option<Value>>;

    async fn set_action_ref(&self, key: &ActionRefKey, value: Value) -> Result<()>;

    async fn delete_action_ref(&self, key: &ActionRefKey) -> Result<()>;
}

// =============================================================================
// Credentials and Settings
// =============================================================================

#[async_trait]
pub trait BaseCredentialStore: Send + Sync {
    /// App registration as stored; each adapter parses its own shape.
    async fn get_app_config(&self, user_id: UserId, platform: Platform) -> Result<Option<Value>>;

    async fn get_tokens(&self, user_id: UserId, platform: Platform)
        -> Result<Option<PlatformTokens>>;

    async fn save_tokens(
        &self,
        user_id: UserId,
        platform: Platform,
        tokens: &PlatformTokens,
    ) -> Result<()>;
}

#[async_trait]
pub trait BaseSyncSettings: Send + Sync {
    async fn settings_for(&self, user_id: UserId) -> Result<SyncSettings>;

    async fn enabled_platforms(&self, user_id: UserId) -> Result<Vec<Platform>> {
        Ok(self.settings_for(user_id).await?.enabled_platforms())
    }
}

#[async_trait]
pub trait BaseSyncAudit: Send + Sync {
    async fn record(&self, entry: &SyncAuditEntry) -> Result<()>;
}

// =============================================================================
// Read-only Collaborators (links, media, federation)
// =============================================================================

/// Where an embed points, plus whatever card metadata is known.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[async_trait]
pub trait BaseLinkResolver: Send + Sync {
    /// `None` when the embed has nothing to link to.
    async fn resolve(&self, embed: &Embed) -> Result<Option<LinkPreview>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
pub trait BaseMediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FederationRequest {
    pub actor_id: UserId,
    pub post_id: PostId,
    pub event: SyncEvent,
}

#[async_trait]
pub trait BaseFederation: Send + Sync {
    async fn sync_post(&self, request: &FederationRequest) -> Result<()>;
}

// =============================================================================
// Platform APIs (Infrastructure - thin wrappers over the client crates)
// =============================================================================

/// Errors keep their client type (`TwitterError`) inside the `anyhow::Error`
/// so callers can classify them.
#[async_trait]
pub trait BaseTwitterApi: Send + Sync {
    async fn create_tweet(&self, token: &str, request: &CreateTweetRequest) -> Result<Tweet>;

    async fn delete_tweet(&self, token: &str, tweet_id: &str) -> Result<()>;

    async fn me(&self, token: &str) -> Result<User>;

    async fn retweet(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()>;

    async fn unretweet(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()>;

    async fn like(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()>;

    async fn unlike(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()>;

    async fn bookmark(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()>;

    async fn remove_bookmark(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()>;

    async fn refresh_token(&self, app: &TwitterAppConfig, refresh_token: &str)
        -> Result<OAuthToken>;
}

/// Errors keep their client type (`BlueskyError`) inside the `anyhow::Error`.
#[async_trait]
pub trait BaseBlueskyApi: Send + Sync {
    async fn create_session(&self, identifier: &str, password: &str) -> Result<Session>;

    async fn refresh_session(&self, refresh_jwt: &str) -> Result<Session>;

    async fn create_record(
        &self,
        access_jwt: &str,
        repo: &str,
        collection: &str,
        record: &Value,
    ) -> Result<StrongRef>;

    async fn delete_record(
        &self,
        access_jwt: &str,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<()>;

    /// Returns the blob object to embed in a record.
    async fn upload_blob(&self, access_jwt: &str, bytes: Vec<u8>, mime_type: &str)
        -> Result<Value>;

    async fn resolve_handle(&self, handle: &str) -> Result<String>;

    async fn create_bookmark(&self, access_jwt: &str, subject: &StrongRef) -> Result<()>;

    async fn delete_bookmark(&self, access_jwt: &str, uri: &str) -> Result<()>;
}
