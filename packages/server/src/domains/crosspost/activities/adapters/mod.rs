//! Platform adapters: one fixed operation set, one implementation per
//! platform.

pub mod bluesky;
pub mod twitter;

pub use bluesky::BlueskyAdapter;
pub use twitter::TwitterAdapter;

use anyhow::Result;
use async_trait::async_trait;

use crate::common::UserId;
use crate::domains::crosspost::models::{Platform, PlatformOutcome, Post, SyncEvent};
use crate::kernel::SyncDeps;

/// Refresh access tokens this long before they expire.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Mirrors home actions onto one external platform for one acting user.
///
/// Expected conditions (already synced, missing refs) come back as
/// `PlatformOutcome::Skipped`; `Err` means a remote call or a store failed.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Create, reply, quote or retweet, unless a ref already exists.
    async fn create_post(&self, post: &Post) -> Result<PlatformOutcome>;

    async fn delete_post(&self, post: &Post) -> Result<PlatformOutcome>;

    async fn like(&self, post: &Post) -> Result<PlatformOutcome>;

    async fn unlike(&self, post: &Post) -> Result<PlatformOutcome>;

    async fn bookmark(&self, post: &Post) -> Result<PlatformOutcome>;

    async fn unbookmark(&self, post: &Post) -> Result<PlatformOutcome>;

    /// Route a sync event to its operation.
    async fn apply(&self, event: SyncEvent, post: &Post) -> Result<PlatformOutcome> {
        match event {
            SyncEvent::Create | SyncEvent::Reply | SyncEvent::Quote => self.create_post(post).await,
            SyncEvent::Delete => self.delete_post(post).await,
            SyncEvent::Like => self.like(post).await,
            SyncEvent::Unlike => self.unlike(post).await,
            SyncEvent::Bookmark => self.bookmark(post).await,
            SyncEvent::Unbookmark => self.unbookmark(post).await,
        }
    }
}

/// Adapter for `platform`, acting as `actor_id`. Sessions open on first use.
pub fn adapter_for(platform: Platform, actor_id: UserId, deps: &SyncDeps) -> Box<dyn PlatformAdapter> {
    match platform {
        Platform::Twitter => Box::new(TwitterAdapter::new(actor_id, deps.clone())),
        Platform::Bluesky => Box::new(BlueskyAdapter::new(actor_id, deps.clone())),
    }
}
