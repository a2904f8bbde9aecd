//! Postgres implementations of the store traits, delegating to the model
//! queries in `domains::crosspost::models`.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{
    BaseCredentialStore, BaseEntityReader, BasePostReader, BaseRefStore, BaseSyncAudit,
    BaseSyncSettings,
};
use crate::common::{ListId, PostId, ProjectId, UserId};
use crate::domains::crosspost::models::{
    ActionRefKey, ActionRefRecord, EntitySummary, Platform, PlatformCredential, PlatformRefRecord,
    PlatformTokens, Post, SyncAuditEntry, SyncSettings,
};

pub struct PgPostReader {
    pool: PgPool,
}

impl PgPostReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasePostReader for PgPostReader {
    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>> {
        Post::find_by_id(post_id, &self.pool).await
    }
}

pub struct PgEntityReader {
    pool: PgPool,
}

impl PgEntityReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseEntityReader for PgEntityReader {
    async fn get_user(&self, user_id: UserId) -> Result<Option<EntitySummary>> {
        EntitySummary::find_user(user_id, &self.pool).await
    }

    async fn get_project(&self, project_id: ProjectId) -> Result<Option<EntitySummary>> {
        EntitySummary::find_project(project_id, &self.pool).await
    }

    async fn get_list(&self, list_id: ListId) -> Result<Option<EntitySummary>> {
        EntitySummary::find_list(list_id, &self.pool).await
    }
}

/// Refs, credentials, settings and audit rows in one pool.
#[derive(Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRefStore for PgSyncStore {
    async fn get_platform_ref(&self, post_id: PostId, platform: Platform) -> Result<Option<Value>> {
        Ok(PlatformRefRecord::find(post_id, platform, &self.pool)
            .await?
            .map(|r| r.value.0))
    }

    async fn set_platform_ref(
        &self,
        post_id: PostId,
        platform: Platform,
        value: Value,
    ) -> Result<()> {
        PlatformRefRecord::insert(post_id, platform, value, &self.pool).await
    }

    async fn delete_platform_ref(&self, post_id: PostId, platform: Platform) -> Result<()> {
        PlatformRefRecord::delete(post_id, platform, &self.pool).await
    }

    async fn get_action_ref(&self, key: &ActionRefKey) -> Result<Option<Value>> {
        Ok(ActionRefRecord::find(key, &self.pool).await?.map(|r| r.value.0))
    }

    async fn set_action_ref(&self, key: &ActionRefKey, value: Value) -> Result<()> {
        ActionRefRecord::insert(key, value, &self.pool).await
    }

    async fn delete_action_ref(&self, key: &ActionRefKey) -> Result<()> {
        ActionRefRecord::delete(key, &self.pool).await
    }
}

#[async_trait]
impl BaseCredentialStore for PgSyncStore {
    async fn get_app_config(&self, user_id: UserId, platform: Platform) -> Result<Option<Value>> {
        Ok(PlatformCredential::find(user_id, platform, &self.pool)
            .await?
            .and_then(|c| c.app_config)
            .map(|c| c.0))
    }

    async fn get_tokens(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<PlatformTokens>> {
        Ok(PlatformCredential::find(user_id, platform, &self.pool)
            .await?
            .and_then(|c| c.tokens)
            .map(|t| t.0))
    }

    async fn save_tokens(
        &self,
        user_id: UserId,
        platform: Platform,
        tokens: &PlatformTokens,
    ) -> Result<()> {
        PlatformCredential::save_tokens(user_id, platform, tokens, &self.pool).await
    }
}

#[async_trait]
impl BaseSyncSettings for PgSyncStore {
    async fn settings_for(&self, user_id: UserId) -> Result<SyncSettings> {
        SyncSettings::find_for_user(user_id, &self.pool).await
    }
}

#[async_trait]
impl BaseSyncAudit for PgSyncStore {
    async fn record(&self, entry: &SyncAuditEntry) -> Result<()> {
        entry.upsert(&self.pool).await
    }
}
