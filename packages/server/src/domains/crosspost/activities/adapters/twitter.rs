use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use twitter_client::CreateTweetRequest;

use super::{PlatformAdapter, TOKEN_REFRESH_MARGIN_SECS};
use crate::common::{PostId, UserId};
use crate::domains::crosspost::activities::transform::tweet_text;
use crate::domains::crosspost::models::{
    load_platform_ref, save_platform_ref, AppliedAction, Platform, PlatformOutcome, Post,
    PostType, SkipReason, TwitterAppConfig, TwitterRef,
};
use crate::kernel::SyncDeps;

struct TwitterSession {
    access_token: String,
    /// Numeric id of the linked account; engagement endpoints are per user.
    account_id: String,
}

pub struct TwitterAdapter {
    actor_id: UserId,
    deps: SyncDeps,
    session: OnceCell<TwitterSession>,
}

impl TwitterAdapter {
    pub fn new(actor_id: UserId, deps: SyncDeps) -> Self {
        Self {
            actor_id,
            deps,
            session: OnceCell::new(),
        }
    }

    async fn session(&self) -> Result<&TwitterSession> {
        self.session.get_or_try_init(|| self.open_session()).await
    }

    /// Load tokens, refresh them if they are about to expire, and fill in
    /// the account id. Writes back only what changed.
    async fn open_session(&self) -> Result<TwitterSession> {
        let stored = self
            .deps
            .credentials
            .get_tokens(self.actor_id, Platform::Twitter)
            .await?
            .ok_or_else(|| anyhow!("Twitter account is not linked"))?;

        let mut tokens = stored.clone();
        let now = Utc::now();

        if tokens.expires_within(now, Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)) {
            let refresh_token = tokens
                .refresh_token
                .clone()
                .ok_or_else(|| anyhow!("Twitter token expired and no refresh token is stored"))?;
            let app = self.app_config().await?;
            let fresh = self
                .deps
                .twitter
                .refresh_token(&app, &refresh_token)
                .await
                .context("Failed to refresh Twitter token")?;

            tokens.expires_at = fresh.expires_at(now);
            tokens.refresh_token = fresh.refresh_token.or(tokens.refresh_token);
            tokens.access_token = fresh.access_token;
            debug!(user_id = %self.actor_id, "Refreshed Twitter token");
        }

        let account_id = match tokens.account_id.clone() {
            Some(id) => id,
            None => {
                let me = self.deps.twitter.me(&tokens.access_token).await?;
                tokens.account_id = Some(me.id.clone());
                tokens.handle = Some(me.username);
                me.id
            }
        };

        if tokens != stored {
            self.deps
                .credentials
                .save_tokens(self.actor_id, Platform::Twitter, &tokens)
                .await?;
        }

        Ok(TwitterSession {
            access_token: tokens.access_token,
            account_id,
        })
    }

    async fn app_config(&self) -> Result<TwitterAppConfig> {
        let raw = self
            .deps
            .credentials
            .get_app_config(self.actor_id, Platform::Twitter)
            .await?
            .ok_or_else(|| anyhow!("Twitter app credentials are not configured"))?;
        serde_json::from_value(raw).context("Malformed Twitter app credentials")
    }

    async fn load_ref(&self, post_id: PostId) -> Result<Option<TwitterRef>> {
        load_platform_ref::<TwitterRef>(self.deps.refs.as_ref(), post_id).await
    }

    async fn create_retweet(&self, post: &Post) -> Result<PlatformOutcome> {
        let target = match post.retweet_of_id {
            Some(original) => self.load_ref(original).await?,
            None => None,
        };
        let Some(target) = target else {
            debug!(post_id = %post.id, "Retweeted post is not on Twitter");
            return Ok(PlatformOutcome::skipped(SkipReason::MissingTargetRef));
        };

        let session = self.session().await?;
        self.deps
            .twitter
            .retweet(&session.access_token, &session.account_id, target.tweet_id())
            .await?;

        let created = TwitterRef::retweet(target.tweet_id());
        save_platform_ref(self.deps.refs.as_ref(), post.id, &created).await?;
        info!(post_id = %post.id, tweet_id = %target.tweet_id(), "Retweeted on Twitter");
        Ok(PlatformOutcome::posted(created))
    }
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn create_post(&self, post: &Post) -> Result<PlatformOutcome> {
        if self.load_ref(post.id).await?.is_some() {
            return Ok(PlatformOutcome::skipped(SkipReason::AlreadySynced));
        }

        if post.post_type == PostType::Retweet {
            return self.create_retweet(post).await;
        }

        let text = tweet_text(post, self.deps.links.as_ref(), &self.deps.asset_base_url).await?;
        let mut request = CreateTweetRequest::new(text);

        if let Some(parent_id) = post.in_reply_to_id {
            let Some(parent) = self.load_ref(parent_id).await? else {
                debug!(post_id = %post.id, parent_id = %parent_id, "Reply parent is not on Twitter");
                return Ok(PlatformOutcome::skipped(SkipReason::MissingTargetRef));
            };
            request = request.in_reply_to(parent.tweet_id());
        }

        if let Some(quoted_id) = post.quoted_post_id {
            let Some(quoted) = self.load_ref(quoted_id).await? else {
                debug!(post_id = %post.id, quoted_id = %quoted_id, "Quoted post is not on Twitter");
                return Ok(PlatformOutcome::skipped(SkipReason::MissingTargetRef));
            };
            request = request.quoting(quoted.tweet_id());
        }

        let session = self.session().await?;
        let tweet = self
            .deps
            .twitter
            .create_tweet(&session.access_token, &request)
            .await?;

        let created = TwitterRef::tweet(tweet.id);
        save_platform_ref(self.deps.refs.as_ref(), post.id, &created).await?;
        info!(post_id = %post.id, tweet_id = %created.tweet_id(), "Posted to Twitter");
        Ok(PlatformOutcome::posted(created))
    }

    async fn delete_post(&self, post: &Post) -> Result<PlatformOutcome> {
        let Some(existing) = self.load_ref(post.id).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::NotSynced));
        };

        let session = self.session().await?;
        match &existing {
            TwitterRef::Tweet { id } => {
                self.deps
                    .twitter
                    .delete_tweet(&session.access_token, id)
                    .await?
            }
            TwitterRef::Retweet { target_id, .. } => {
                self.deps
                    .twitter
                    .unretweet(&session.access_token, &session.account_id, target_id)
                    .await?
            }
        }

        self.deps
            .refs
            .delete_platform_ref(post.id, Platform::Twitter)
            .await?;
        info!(post_id = %post.id, tweet_id = %existing.tweet_id(), "Deleted from Twitter");
        Ok(PlatformOutcome::applied(AppliedAction::Deleted))
    }

    async fn like(&self, post: &Post) -> Result<PlatformOutcome> {
        let Some(target) = self.load_ref(post.engagement_target()).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        self.deps
            .twitter
            .like(&session.access_token, &session.account_id, target.tweet_id())
            .await?;
        info!(post_id = %post.id, tweet_id = %target.tweet_id(), "Liked on Twitter");
        Ok(PlatformOutcome::applied(AppliedAction::Liked))
    }

    async fn unlike(&self, post: &Post) -> Result<PlatformOutcome> {
        // Twitter likes are keyed by the tweet itself
        let Some(target) = self.load_ref(post.engagement_target()).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        self.deps
            .twitter
            .unlike(&session.access_token, &session.account_id, target.tweet_id())
            .await?;
        info!(post_id = %post.id, tweet_id = %target.tweet_id(), "Unliked on Twitter");
        Ok(PlatformOutcome::applied(AppliedAction::Unliked))
    }

    async fn bookmark(&self, post: &Post) -> Result<PlatformOutcome> {
        let Some(target) = self.load_ref(post.engagement_target()).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        self.deps
            .twitter
            .bookmark(&session.access_token, &session.account_id, target.tweet_id())
            .await?;
        info!(post_id = %post.id, tweet_id = %target.tweet_id(), "Bookmarked on Twitter");
        Ok(PlatformOutcome::applied(AppliedAction::Bookmarked))
    }

    async fn unbookmark(&self, post: &Post) -> Result<PlatformOutcome> {
        let Some(target) = self.load_ref(post.engagement_target()).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        self.deps
            .twitter
            .remove_bookmark(&session.access_token, &session.account_id, target.tweet_id())
            .await?;
        info!(post_id = %post.id, tweet_id = %target.tweet_id(), "Removed Twitter bookmark");
        Ok(PlatformOutcome::applied(AppliedAction::Unbookmarked))
    }
}
