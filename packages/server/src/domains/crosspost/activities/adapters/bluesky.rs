use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bluesky_client::{jwt_expiry, AtUri, Session, LIKE_COLLECTION, POST_COLLECTION, REPOST_COLLECTION};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{PlatformAdapter, TOKEN_REFRESH_MARGIN_SECS};
use crate::common::{PostId, UserId};
use crate::domains::crosspost::activities::transform::{BlueskyRenderer, ReplyRefs};
use crate::domains::crosspost::models::{
    load_action_ref, load_platform_ref, save_platform_ref, ActionKind, ActionRefKey,
    AppliedAction, BlueskyAppConfig, BlueskyRef, Platform, PlatformOutcome, PlatformTokens, Post,
    PostType, SkipReason,
};
use crate::kernel::SyncDeps;

struct BlueskySession {
    access_jwt: String,
    did: String,
}

pub struct BlueskyAdapter {
    actor_id: UserId,
    deps: SyncDeps,
    session: OnceCell<BlueskySession>,
}

fn tokens_from_session(session: Session) -> PlatformTokens {
    PlatformTokens {
        expires_at: jwt_expiry(&session.access_jwt),
        access_token: session.access_jwt,
        refresh_token: Some(session.refresh_jwt),
        account_id: Some(session.did),
        handle: Some(session.handle),
    }
}

fn needs_refresh(tokens: &PlatformTokens, now: DateTime<Utc>) -> bool {
    tokens
        .expires_at
        .or_else(|| jwt_expiry(&tokens.access_token))
        .map(|expires_at| expires_at <= now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS))
        .unwrap_or(false)
}

impl BlueskyAdapter {
    pub fn new(actor_id: UserId, deps: SyncDeps) -> Self {
        Self {
            actor_id,
            deps,
            session: OnceCell::new(),
        }
    }

    async fn session(&self) -> Result<&BlueskySession> {
        self.session.get_or_try_init(|| self.open_session()).await
    }

    /// Reuse the stored session, refresh it when the access JWT is about to
    /// expire, and fall back to a password login when refreshing fails.
    async fn open_session(&self) -> Result<BlueskySession> {
        let stored = self
            .deps
            .credentials
            .get_tokens(self.actor_id, Platform::Bluesky)
            .await?;
        let now = Utc::now();

        let mut tokens = match &stored {
            Some(t) if !needs_refresh(t, now) => t.clone(),
            Some(t) => match &t.refresh_token {
                Some(refresh_jwt) => match self.deps.bluesky.refresh_session(refresh_jwt).await {
                    Ok(session) => {
                        debug!(user_id = %self.actor_id, "Refreshed Bluesky session");
                        tokens_from_session(session)
                    }
                    Err(e) => {
                        warn!(user_id = %self.actor_id, error = %e, "Bluesky session refresh failed, logging in again");
                        self.login().await?
                    }
                },
                None => self.login().await?,
            },
            None => self.login().await?,
        };

        let did = match tokens.account_id.clone() {
            Some(did) => did,
            None => {
                let handle = tokens
                    .handle
                    .clone()
                    .ok_or_else(|| anyhow!("Bluesky tokens carry neither a DID nor a handle"))?;
                let did = self.deps.bluesky.resolve_handle(&handle).await?;
                tokens.account_id = Some(did.clone());
                did
            }
        };

        if stored.as_ref() != Some(&tokens) {
            self.deps
                .credentials
                .save_tokens(self.actor_id, Platform::Bluesky, &tokens)
                .await?;
        }

        Ok(BlueskySession {
            access_jwt: tokens.access_token,
            did,
        })
    }

    async fn login(&self) -> Result<PlatformTokens> {
        let raw = self
            .deps
            .credentials
            .get_app_config(self.actor_id, Platform::Bluesky)
            .await?
            .ok_or_else(|| anyhow!("Bluesky account is not linked"))?;
        let app: BlueskyAppConfig =
            serde_json::from_value(raw).context("Malformed Bluesky app credentials")?;
        let password = app
            .app_password
            .ok_or_else(|| anyhow!("Bluesky session expired and no app password is stored"))?;

        let session = self
            .deps
            .bluesky
            .create_session(&app.identifier, &password)
            .await
            .context("Failed to log in to Bluesky")?;
        debug!(user_id = %self.actor_id, did = %session.did, "Created Bluesky session");
        Ok(tokens_from_session(session))
    }

    async fn load_ref(&self, post_id: PostId) -> Result<Option<BlueskyRef>> {
        load_platform_ref::<BlueskyRef>(self.deps.refs.as_ref(), post_id).await
    }

    fn action_key(&self, post: &Post, action: ActionKind) -> ActionRefKey {
        ActionRefKey {
            post_id: post.engagement_target(),
            platform: Platform::Bluesky,
            action,
            user_id: self.actor_id,
        }
    }

    async fn create_repost(&self, post: &Post) -> Result<PlatformOutcome> {
        let target = match post.retweet_of_id {
            Some(original) => self.load_ref(original).await?,
            None => None,
        };
        let Some(target) = target else {
            debug!(post_id = %post.id, "Reposted post is not on Bluesky");
            return Ok(PlatformOutcome::skipped(SkipReason::MissingTargetRef));
        };

        let session = self.session().await?;
        let record = json!({
            "$type": REPOST_COLLECTION,
            "subject": target.strong_ref(),
            "createdAt": Utc::now().to_rfc3339(),
        });
        let created = self
            .deps
            .bluesky
            .create_record(&session.access_jwt, &session.did, REPOST_COLLECTION, &record)
            .await?;

        let created = BlueskyRef::repost(created);
        save_platform_ref(self.deps.refs.as_ref(), post.id, &created).await?;
        info!(post_id = %post.id, uri = %created.uri, "Reposted on Bluesky");
        Ok(PlatformOutcome::posted(created))
    }

    /// Parent and root refs for a reply; a reply without a root is its own
    /// thread's first reply.
    async fn reply_refs(&self, post: &Post, parent_id: PostId) -> Result<Option<ReplyRefs>> {
        let Some(parent) = self.load_ref(parent_id).await? else {
            return Ok(None);
        };
        let root_id = post.thread_root_id.unwrap_or(parent_id);
        let root = if root_id == parent_id {
            parent.clone()
        } else {
            match self.load_ref(root_id).await? {
                Some(root) => root,
                None => return Ok(None),
            }
        };

        Ok(Some(ReplyRefs {
            root: root.strong_ref(),
            parent: parent.strong_ref(),
        }))
    }
}

#[async_trait]
impl PlatformAdapter for BlueskyAdapter {
    fn platform(&self) -> Platform {
        Platform::Bluesky
    }

    async fn create_post(&self, post: &Post) -> Result<PlatformOutcome> {
        if self.load_ref(post.id).await?.is_some() {
            return Ok(PlatformOutcome::skipped(SkipReason::AlreadySynced));
        }

        if post.post_type == PostType::Retweet {
            return self.create_repost(post).await;
        }

        let reply = match post.in_reply_to_id {
            Some(parent_id) => match self.reply_refs(post, parent_id).await? {
                Some(refs) => Some(refs),
                None => {
                    debug!(post_id = %post.id, parent_id = %parent_id, "Reply parent or root is not on Bluesky");
                    return Ok(PlatformOutcome::skipped(SkipReason::MissingTargetRef));
                }
            },
            None => None,
        };

        let quote = match post.quoted_post_id {
            Some(quoted_id) => match self.load_ref(quoted_id).await? {
                Some(quoted) => Some(quoted.strong_ref()),
                None => {
                    debug!(post_id = %post.id, quoted_id = %quoted_id, "Quoted post is not on Bluesky");
                    return Ok(PlatformOutcome::skipped(SkipReason::MissingTargetRef));
                }
            },
            None => None,
        };

        let session = self.session().await?;
        let renderer = BlueskyRenderer {
            api: self.deps.bluesky.as_ref(),
            access_jwt: &session.access_jwt,
            links: self.deps.links.as_ref(),
            media: self.deps.media.as_ref(),
            asset_base_url: &self.deps.asset_base_url,
        };
        let record = renderer
            .render(post, reply.as_ref(), quote.as_ref(), Utc::now())
            .await?;

        let created = self
            .deps
            .bluesky
            .create_record(&session.access_jwt, &session.did, POST_COLLECTION, &record)
            .await?;

        let created = BlueskyRef::post(created);
        save_platform_ref(self.deps.refs.as_ref(), post.id, &created).await?;
        info!(post_id = %post.id, uri = %created.uri, "Posted to Bluesky");
        Ok(PlatformOutcome::posted(created))
    }

    async fn delete_post(&self, post: &Post) -> Result<PlatformOutcome> {
        let Some(existing) = self.load_ref(post.id).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::NotSynced));
        };
        // Collection comes from the URI, so posts and reposts delete alike
        let uri: AtUri = existing.uri.parse()?;

        let session = self.session().await?;
        self.deps
            .bluesky
            .delete_record(&session.access_jwt, &session.did, &uri.collection, &uri.rkey)
            .await?;

        self.deps
            .refs
            .delete_platform_ref(post.id, Platform::Bluesky)
            .await?;
        info!(post_id = %post.id, uri = %existing.uri, repost = existing.is_repost(), "Deleted from Bluesky");
        Ok(PlatformOutcome::applied(AppliedAction::Deleted))
    }

    async fn like(&self, post: &Post) -> Result<PlatformOutcome> {
        let key = self.action_key(post, ActionKind::Like);
        if self.deps.refs.get_action_ref(&key).await?.is_some() {
            return Ok(PlatformOutcome::skipped(SkipReason::AlreadySynced));
        }
        let Some(target) = self.load_ref(key.post_id).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        let record = json!({
            "$type": LIKE_COLLECTION,
            "subject": target.strong_ref(),
            "createdAt": Utc::now().to_rfc3339(),
        });
        let created = self
            .deps
            .bluesky
            .create_record(&session.access_jwt, &session.did, LIKE_COLLECTION, &record)
            .await?;

        let like = BlueskyRef::post(created);
        self.deps
            .refs
            .set_action_ref(&key, serde_json::to_value(&like)?)
            .await?;
        info!(post_id = %post.id, uri = %like.uri, "Liked on Bluesky");
        Ok(PlatformOutcome::applied(AppliedAction::Liked))
    }

    async fn unlike(&self, post: &Post) -> Result<PlatformOutcome> {
        // Only the like record's own URI can undo it
        let key = self.action_key(post, ActionKind::Like);
        let Some(like) = load_action_ref::<BlueskyRef>(self.deps.refs.as_ref(), &key).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };
        let uri: AtUri = like.uri.parse()?;

        let session = self.session().await?;
        self.deps
            .bluesky
            .delete_record(&session.access_jwt, &session.did, LIKE_COLLECTION, &uri.rkey)
            .await?;

        self.deps.refs.delete_action_ref(&key).await?;
        info!(post_id = %post.id, uri = %like.uri, "Unliked on Bluesky");
        Ok(PlatformOutcome::applied(AppliedAction::Unliked))
    }

    async fn bookmark(&self, post: &Post) -> Result<PlatformOutcome> {
        let Some(target) = self.load_ref(post.engagement_target()).await? else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        self.deps
            .bluesky
            .create_bookmark(&session.access_jwt, &target.strong_ref())
            .await?;
        info!(post_id = %post.id, uri = %target.uri, "Bookmarked on Bluesky");
        Ok(PlatformOutcome::applied(AppliedAction::Bookmarked))
    }

    async fn unbookmark(&self, post: &Post) -> Result<PlatformOutcome> {
        let key = self.action_key(post, ActionKind::Bookmark);
        let action_ref = load_action_ref::<BlueskyRef>(self.deps.refs.as_ref(), &key).await?;
        let target = match &action_ref {
            Some(r) => Some(r.clone()),
            None => self.load_ref(key.post_id).await?,
        };
        let Some(target) = target else {
            return Ok(PlatformOutcome::skipped(SkipReason::MissingRef));
        };

        let session = self.session().await?;
        self.deps
            .bluesky
            .delete_bookmark(&session.access_jwt, &target.uri)
            .await?;

        if action_ref.is_some() {
            self.deps.refs.delete_action_ref(&key).await?;
        }
        info!(post_id = %post.id, uri = %target.uri, "Removed Bluesky bookmark");
        Ok(PlatformOutcome::applied(AppliedAction::Unbookmarked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{BlueskyCall, TEST_BLUESKY_DID};
    use crate::kernel::TestDependencies;

    const ACTOR: UserId = UserId(1);

    fn post_ref(rkey: &str) -> serde_json::Value {
        json!({
            "uri": format!("at://did:plc:other/app.bsky.feed.post/{}", rkey),
            "cid": format!("bafy{}", rkey),
        })
    }

    #[tokio::test]
    async fn test_reply_without_root_uses_parent_as_root() {
        let test = TestDependencies::new();
        test.link_accounts(ACTOR);
        test.store
            .insert_platform_ref(PostId(1), Platform::Bluesky, post_ref("p1"));
        let reply = Post::builder()
            .id(PostId(2))
            .author_id(ACTOR)
            .post_type(PostType::Reply)
            .content("agreed")
            .in_reply_to_id(PostId(1))
            .build();
        let adapter = BlueskyAdapter::new(ACTOR, test.deps());

        adapter.create_post(&reply).await.unwrap();

        let records = test.bluesky.created_records(POST_COLLECTION);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["reply"]["root"]["cid"], "bafyp1");
        assert_eq!(records[0]["reply"]["parent"]["cid"], "bafyp1");
    }

    #[tokio::test]
    async fn test_reply_needs_the_thread_root_too() {
        let test = TestDependencies::new();
        test.link_accounts(ACTOR);
        test.store
            .insert_platform_ref(PostId(2), Platform::Bluesky, post_ref("p2"));
        let reply = Post::builder()
            .id(PostId(3))
            .author_id(ACTOR)
            .post_type(PostType::Reply)
            .content("late")
            .in_reply_to_id(PostId(2))
            .thread_root_id(PostId(1))
            .build();
        let adapter = BlueskyAdapter::new(ACTOR, test.deps());

        let outcome = adapter.create_post(&reply).await.unwrap();

        assert_eq!(outcome, PlatformOutcome::skipped(SkipReason::MissingTargetRef));
        assert_eq!(test.bluesky.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bookmark_round_trip_uses_target_ref() {
        let test = TestDependencies::new();
        test.link_accounts(ACTOR);
        test.store
            .insert_platform_ref(PostId(1), Platform::Bluesky, post_ref("p1"));
        let post = Post::builder().id(PostId(1)).author_id(UserId(9)).build();
        let adapter = BlueskyAdapter::new(ACTOR, test.deps());

        adapter.bookmark(&post).await.unwrap();
        let outcome = adapter.unbookmark(&post).await.unwrap();

        assert_eq!(outcome, PlatformOutcome::applied(AppliedAction::Unbookmarked));
        assert_eq!(
            test.bluesky.calls(),
            vec![
                BlueskyCall::CreateBookmark {
                    uri: "at://did:plc:other/app.bsky.feed.post/p1".into()
                },
                BlueskyCall::DeleteBookmark {
                    uri: "at://did:plc:other/app.bsky.feed.post/p1".into()
                },
            ]
        );
        assert_eq!(test.store.action_ref_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_password_login() {
        let test = TestDependencies::new();
        test.store.enable(ACTOR, &[Platform::Bluesky]);
        test.store.insert_app_config(
            ACTOR,
            Platform::Bluesky,
            json!({"identifier": "tester.bsky.social", "app_password": "xxxx-xxxx"}),
        );
        test.store.insert_tokens(
            ACTOR,
            Platform::Bluesky,
            PlatformTokens {
                access_token: "stale".into(),
                refresh_token: Some("expired-refresh".into()),
                expires_at: Some(Utc::now() - Duration::minutes(5)),
                account_id: Some(TEST_BLUESKY_DID.into()),
                handle: None,
            },
        );
        test.bluesky
            .fail_next(400, Some("ExpiredToken"), "Token has expired");
        let post = Post::builder()
            .id(PostId(5))
            .author_id(ACTOR)
            .content("back again")
            .build();
        let adapter = BlueskyAdapter::new(ACTOR, test.deps());

        adapter.create_post(&post).await.unwrap();

        let calls = test.bluesky.calls();
        assert_eq!(calls[0], BlueskyCall::RefreshSession);
        assert_eq!(
            calls[1],
            BlueskyCall::CreateSession {
                identifier: "tester.bsky.social".into()
            }
        );
        let saved = test.store.tokens(ACTOR, Platform::Bluesky).unwrap();
        assert_eq!(saved.access_token, "bsky-access-new");
        assert_eq!(test.store.token_saves().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_repost_uses_repost_collection() {
        let test = TestDependencies::new();
        test.link_accounts(ACTOR);
        test.store.insert_platform_ref(
            PostId(4),
            Platform::Bluesky,
            json!({
                "uri": format!("at://{}/app.bsky.feed.repost/rp1", TEST_BLUESKY_DID),
                "cid": "bafyrp1",
                "kind": "repost"
            }),
        );
        let post = Post::builder()
            .id(PostId(4))
            .author_id(ACTOR)
            .post_type(PostType::Retweet)
            .retweet_of_id(PostId(1))
            .build();
        let adapter = BlueskyAdapter::new(ACTOR, test.deps());

        adapter.delete_post(&post).await.unwrap();

        assert_eq!(
            test.bluesky.calls(),
            vec![BlueskyCall::DeleteRecord {
                collection: REPOST_COLLECTION.into(),
                rkey: "rp1".into()
            }]
        );
    }
}
