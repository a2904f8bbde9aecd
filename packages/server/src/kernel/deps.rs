//! Sync dependencies (using traits for testability)
//!
//! This module provides the dependency container handed to every sync job.
//! All external services use trait abstractions so tests can swap in the
//! in-memory doubles from `test_dependencies`.

use anyhow::Result;
use async_trait::async_trait;
use bluesky_client::{BlueskyClient, Session, StrongRef};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use twitter_client::{CreateTweetRequest, OAuthToken, Tweet, TwitterClient, User};
use typed_builder::TypedBuilder;

use crate::config::Config;
use crate::domains::crosspost::models::TwitterAppConfig;
use crate::kernel::{
    BaseBlueskyApi, BaseCredentialStore, BaseFederation, BaseLinkResolver, BaseMediaFetcher,
    BasePostReader, BaseRefStore, BaseSyncAudit, BaseSyncSettings, BaseTwitterApi,
    HomeLinkResolver, HttpMediaFetcher, LoggingFederation, PgEntityReader, PgPostReader,
    PgSyncStore,
};

// =============================================================================
// TwitterClient Adapter (implements BaseTwitterApi trait)
// =============================================================================

/// Wrapper around TwitterClient that implements BaseTwitterApi trait
pub struct TwitterService(pub Arc<TwitterClient>);

impl TwitterService {
    pub fn new(client: Arc<TwitterClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseTwitterApi for TwitterService {
    async fn create_tweet(&self, token: &str, request: &CreateTweetRequest) -> Result<Tweet> {
        Ok(self.0.create_tweet(token, request).await?)
    }

    async fn delete_tweet(&self, token: &str, tweet_id: &str) -> Result<()> {
        self.0.delete_tweet(token, tweet_id).await?;
        Ok(())
    }

    async fn me(&self, token: &str) -> Result<User> {
        Ok(self.0.me(token).await?)
    }

    async fn retweet(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.0.retweet(token, user_id, tweet_id).await?;
        Ok(())
    }

    async fn unretweet(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.0.unretweet(token, user_id, tweet_id).await?;
        Ok(())
    }

    async fn like(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.0.like(token, user_id, tweet_id).await?;
        Ok(())
    }

    async fn unlike(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.0.unlike(token, user_id, tweet_id).await?;
        Ok(())
    }

    async fn bookmark(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.0.bookmark(token, user_id, tweet_id).await?;
        Ok(())
    }

    async fn remove_bookmark(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.0.remove_bookmark(token, user_id, tweet_id).await?;
        Ok(())
    }

    async fn refresh_token(
        &self,
        app: &TwitterAppConfig,
        refresh_token: &str,
    ) -> Result<OAuthToken> {
        Ok(self
            .0
            .refresh_token(&app.client_id, &app.client_secret, refresh_token)
            .await?)
    }
}

// =============================================================================
// BlueskyClient Adapter (implements BaseBlueskyApi trait)
// =============================================================================

/// Wrapper around BlueskyClient that implements BaseBlueskyApi trait
pub struct BlueskyService(pub Arc<BlueskyClient>);

impl BlueskyService {
    pub fn new(client: Arc<BlueskyClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseBlueskyApi for BlueskyService {
    async fn create_session(&self, identifier: &str, password: &str) -> Result<Session> {
        Ok(self.0.create_session(identifier, password).await?)
    }

    async fn refresh_session(&self, refresh_jwt: &str) -> Result<Session> {
        Ok(self.0.refresh_session(refresh_jwt).await?)
    }

    async fn create_record(
        &self,
        access_jwt: &str,
        repo: &str,
        collection: &str,
        record: &Value,
    ) -> Result<StrongRef> {
        Ok(self
            .0
            .create_record(access_jwt, repo, collection, record)
            .await?)
    }

    async fn delete_record(
        &self,
        access_jwt: &str,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<()> {
        Ok(self
            .0
            .delete_record(access_jwt, repo, collection, rkey)
            .await?)
    }

    async fn upload_blob(
        &self,
        access_jwt: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Value> {
        Ok(self.0.upload_blob(access_jwt, bytes, mime_type).await?)
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        Ok(self.0.resolve_handle(handle).await?)
    }

    async fn create_bookmark(&self, access_jwt: &str, subject: &StrongRef) -> Result<()> {
        Ok(self.0.create_bookmark(access_jwt, subject).await?)
    }

    async fn delete_bookmark(&self, access_jwt: &str, uri: &str) -> Result<()> {
        Ok(self.0.delete_bookmark(access_jwt, uri).await?)
    }
}

// =============================================================================
// SyncDeps
// =============================================================================

/// Dependencies accessible to a sync job (using traits for testability)
#[derive(Clone, TypedBuilder)]
pub struct SyncDeps {
    pub posts: Arc<dyn BasePostReader>,
    pub refs: Arc<dyn BaseRefStore>,
    pub credentials: Arc<dyn BaseCredentialStore>,
    pub settings: Arc<dyn BaseSyncSettings>,
    pub audit: Arc<dyn BaseSyncAudit>,
    pub links: Arc<dyn BaseLinkResolver>,
    pub media: Arc<dyn BaseMediaFetcher>,
    pub federation: Arc<dyn BaseFederation>,
    pub twitter: Arc<dyn BaseTwitterApi>,
    pub bluesky: Arc<dyn BaseBlueskyApi>,
    /// Base URL of the content-addressed asset store.
    #[builder(setter(into))]
    pub asset_base_url: String,
}

impl SyncDeps {
    /// Production wiring: Postgres stores, HTTP clients, home links.
    pub fn from_config(config: &Config, pool: PgPool) -> Result<Self> {
        let store = Arc::new(PgSyncStore::new(pool.clone()));
        let posts: Arc<dyn BasePostReader> = Arc::new(PgPostReader::new(pool.clone()));
        let links = HomeLinkResolver::new(
            config.home_base_url.clone(),
            config.asset_base_url.clone(),
            posts.clone(),
            Arc::new(PgEntityReader::new(pool)),
        );
        let twitter = TwitterClient::with_base_url(
            config.twitter_api_base_url.clone(),
            config.platform_http_timeout,
        )?;
        let bluesky = BlueskyClient::with_timeout(
            config.bluesky_service_url.clone(),
            config.platform_http_timeout,
        )?;

        Ok(Self::builder()
            .posts(posts)
            .refs(store.clone())
            .credentials(store.clone())
            .settings(store.clone())
            .audit(store)
            .links(Arc::new(links))
            .media(Arc::new(HttpMediaFetcher::new(config.platform_http_timeout)?))
            .federation(Arc::new(LoggingFederation))
            .twitter(Arc::new(TwitterService::new(Arc::new(twitter))))
            .bluesky(Arc::new(BlueskyService::new(Arc::new(bluesky))))
            .asset_base_url(config.asset_base_url.clone())
            .build())
    }
}
