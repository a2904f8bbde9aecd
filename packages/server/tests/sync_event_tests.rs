//! End-to-end sync behavior through the in-memory stores and mock platform
//! APIs.

mod common;

use bluesky_client::{AtUri, LIKE_COLLECTION, POST_COLLECTION, REPOST_COLLECTION};
use common::*;
use crosspost_core::common::{PostId, UserId};
use crosspost_core::domains::crosspost::models::{
    ActionKind, ActionRefKey, Platform, Post, SkipReason, SyncReport,
};
use crosspost_core::domains::crosspost::{sync_event, SyncError};
use crosspost_core::kernel::test_dependencies::{BlueskyCall, TwitterCall, TEST_TWITTER_ACCOUNT};
use crosspost_core::kernel::TestDependencies;
use serde_json::json;

fn report_json(report: &SyncReport) -> serde_json::Value {
    serde_json::to_value(report).unwrap()
}

// =============================================================================
// Idempotency
// =============================================================================

#[tokio::test]
async fn create_twice_posts_once_per_platform() {
    let test = linked();
    test.posts.insert(text_post(10, "hello"));
    let deps = test.deps();

    let first = sync_event(ACTOR, PostId(10), "create", &deps).await.unwrap();
    let second = sync_event(ACTOR, PostId(10), "create", &deps).await.unwrap();

    assert_eq!(test.twitter.created_tweets().len(), 1);
    assert_eq!(test.bluesky.created_records(POST_COLLECTION).len(), 1);
    assert_eq!(report_json(&first)["results"]["twitter"], json!({"id": "101"}));
    assert_eq!(
        report_json(&second),
        json!({"results": {
            "twitter": {"skipped": "already_synced"},
            "bluesky": {"skipped": "already_synced"}
        }})
    );
}

#[tokio::test]
async fn reply_and_quote_events_share_the_create_path() {
    let test = linked();
    test.posts.insert(text_post(10, "hello"));
    let deps = test.deps();

    sync_event(ACTOR, PostId(10), "reply", &deps).await.unwrap();
    let again = sync_event(ACTOR, PostId(10), "QUOTE", &deps).await.unwrap();

    assert_eq!(test.twitter.created_tweets().len(), 1);
    assert_eq!(
        again.result(Platform::Twitter).and_then(|o| o.skip_reason()),
        Some(SkipReason::AlreadySynced)
    );
}

// =============================================================================
// Quotes and retweets
// =============================================================================

#[tokio::test]
async fn twitter_quote_carries_quoted_tweet_id() {
    let test = linked();
    test.store
        .insert_platform_ref(PostId(50), Platform::Twitter, twitter_ref("500"));
    test.posts.insert(quote_post(51, 50, "this"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(51), "quote", &deps).await.unwrap();

    assert_eq!(
        report_json(&report),
        json!({"results": {
            "twitter": {"id": "101"},
            "bluesky": {"skipped": "missing_target_ref"}
        }})
    );
    let tweets = test.twitter.created_tweets();
    assert_eq!(tweets.len(), 1);
    assert_eq!(tweets[0].quote_tweet_id.as_deref(), Some("500"));
    assert!(tweets[0].reply.is_none());
    assert_eq!(test.bluesky.call_count(), 0);
    assert!(test.store.platform_ref(PostId(51), Platform::Bluesky).is_none());
}

#[tokio::test]
async fn bluesky_quote_embeds_the_quoted_record() {
    let test = linked();
    test.store
        .insert_platform_ref(PostId(50), Platform::Bluesky, bluesky_ref("orig"));
    test.posts.insert(quote_post(51, 50, "this"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(51), "quote", &deps).await.unwrap();

    assert_eq!(
        report.result(Platform::Twitter).and_then(|o| o.skip_reason()),
        Some(SkipReason::MissingTargetRef)
    );
    assert_eq!(test.twitter.call_count(), 0);
    let records = test.bluesky.created_records(POST_COLLECTION);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["text"], "this");
    assert_eq!(
        records[0]["embed"],
        json!({
            "$type": "app.bsky.embed.record",
            "record": bluesky_ref("orig"),
        })
    );
}

#[tokio::test]
async fn retweet_of_unsynced_original_is_skipped_everywhere() {
    let test = linked();
    test.posts.insert(retweet_post(61, 60));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(61), "create", &deps).await.unwrap();

    assert_eq!(
        report_json(&report),
        json!({"results": {
            "twitter": {"skipped": "missing_target_ref"},
            "bluesky": {"skipped": "missing_target_ref"}
        }})
    );
    assert_eq!(test.twitter.call_count(), 0);
    assert_eq!(test.bluesky.call_count(), 0);
    assert!(test.store.platform_ref(PostId(61), Platform::Twitter).is_none());
    assert!(test.store.platform_ref(PostId(61), Platform::Bluesky).is_none());
}

#[tokio::test]
async fn retweet_of_synced_original_reposts_on_both() {
    let test = linked();
    test.store
        .insert_platform_ref(PostId(60), Platform::Twitter, twitter_ref("600"));
    test.store
        .insert_platform_ref(PostId(60), Platform::Bluesky, bluesky_ref("orig"));
    test.posts.insert(retweet_post(61, 60));
    let deps = test.deps();

    sync_event(ACTOR, PostId(61), "create", &deps).await.unwrap();

    assert_eq!(
        test.twitter.calls(),
        vec![TwitterCall::Retweet {
            user_id: TEST_TWITTER_ACCOUNT.to_string(),
            tweet_id: "600".to_string(),
        }]
    );
    assert!(test.twitter.created_tweets().is_empty());
    let reposts = test.bluesky.created_records(REPOST_COLLECTION);
    assert_eq!(reposts.len(), 1);
    assert_eq!(reposts[0]["subject"], bluesky_ref("orig"));
    assert!(test.bluesky.created_records(POST_COLLECTION).is_empty());
}

// =============================================================================
// Reversibility
// =============================================================================

#[tokio::test]
async fn bluesky_like_then_unlike_uses_captured_record() {
    let test = linked();
    test.store.enable(ACTOR, &[Platform::Bluesky]);
    test.store
        .insert_platform_ref(PostId(5), Platform::Bluesky, bluesky_ref("target"));
    test.posts.insert(Post::builder().id(PostId(5)).author_id(UserId(9)).content("nice").build());
    let deps = test.deps();
    let key = ActionRefKey {
        post_id: PostId(5),
        platform: Platform::Bluesky,
        action: ActionKind::Like,
        user_id: ACTOR,
    };

    let liked = sync_event(ACTOR, PostId(5), "like", &deps).await.unwrap();
    assert_eq!(report_json(&liked)["results"]["bluesky"], json!({"applied": "liked"}));

    let like_ref = test.store.action_ref(&key).expect("like ref stored");
    let like_uri: AtUri = like_ref["uri"].as_str().unwrap().parse().unwrap();
    let likes = test.bluesky.created_records(LIKE_COLLECTION);
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0]["subject"]["cid"], "bafytarget");

    let unliked = sync_event(ACTOR, PostId(5), "unlike", &deps).await.unwrap();
    assert_eq!(report_json(&unliked)["results"]["bluesky"], json!({"applied": "unliked"}));

    let deletes: Vec<_> = test
        .bluesky
        .calls()
        .into_iter()
        .filter(|c| matches!(c, BlueskyCall::DeleteRecord { .. }))
        .collect();
    assert_eq!(
        deletes,
        vec![BlueskyCall::DeleteRecord {
            collection: LIKE_COLLECTION.to_string(),
            rkey: like_uri.rkey,
        }]
    );
    assert_eq!(test.store.action_ref_count(), 0);
}

#[tokio::test]
async fn unlike_without_like_ref_is_skipped() {
    let test = linked();
    test.store.enable(ACTOR, &[Platform::Bluesky]);
    test.store
        .insert_platform_ref(PostId(5), Platform::Bluesky, bluesky_ref("target"));
    test.posts.insert(text_post(5, "nice"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(5), "unlike", &deps).await.unwrap();

    assert_eq!(report_json(&report)["results"]["bluesky"], json!({"skipped": "missing_ref"}));
    assert_eq!(test.bluesky.call_count(), 0);
}

#[tokio::test]
async fn twitter_like_targets_the_retweeted_original() {
    let test = linked();
    test.store.enable(ACTOR, &[Platform::Twitter]);
    test.store
        .insert_platform_ref(PostId(1), Platform::Twitter, twitter_ref("500"));
    test.posts.insert(retweet_post(2, 1));
    let deps = test.deps();

    sync_event(ACTOR, PostId(2), "like", &deps).await.unwrap();
    sync_event(ACTOR, PostId(2), "unlike", &deps).await.unwrap();

    assert_eq!(
        test.twitter.calls(),
        vec![
            TwitterCall::Like {
                user_id: TEST_TWITTER_ACCOUNT.into(),
                tweet_id: "500".into()
            },
            TwitterCall::Unlike {
                user_id: TEST_TWITTER_ACCOUNT.into(),
                tweet_id: "500".into()
            },
        ]
    );
}

// =============================================================================
// Skips
// =============================================================================

#[tokio::test]
async fn reply_to_unsynced_parent_is_skipped_not_failed() {
    let test = linked();
    test.store
        .insert_platform_ref(PostId(41), Platform::Twitter, twitter_ref("100"));
    test.posts.insert(reply_post(42, 41, "me too"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(42), "reply", &deps).await.unwrap();

    assert_eq!(
        report_json(&report),
        json!({"results": {
            "twitter": {"id": "101"},
            "bluesky": {"skipped": "missing_target_ref"}
        }})
    );
    assert_eq!(
        test.twitter.created_tweets()[0].reply.as_ref().map(|r| r.in_reply_to_tweet_id.as_str()),
        Some("100")
    );
    assert_eq!(test.bluesky.call_count(), 0);
    assert_eq!(
        test.store.platform_ref(PostId(42), Platform::Twitter),
        Some(twitter_ref("101"))
    );
}

#[tokio::test]
async fn unbookmark_without_any_ref_makes_no_calls() {
    let test = linked();
    test.posts.insert(text_post(7, "saved"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(7), "unbookmark", &deps).await.unwrap();

    assert_eq!(
        report_json(&report),
        json!({"results": {
            "twitter": {"skipped": "missing_ref"},
            "bluesky": {"skipped": "missing_ref"}
        }})
    );
    assert_eq!(test.twitter.call_count(), 0);
    assert_eq!(test.bluesky.call_count(), 0);
}

#[tokio::test]
async fn delete_without_ref_is_a_no_op() {
    let test = linked();
    test.posts.insert(text_post(8, "never synced"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(8), "delete", &deps).await.unwrap();

    assert_eq!(
        report.result(Platform::Bluesky).and_then(|o| o.skip_reason()),
        Some(SkipReason::NotSynced)
    );
    assert_eq!(test.twitter.call_count(), 0);
}

#[tokio::test]
async fn disabled_user_is_skipped_but_still_federated() {
    let test = TestDependencies::new();
    test.posts.insert(text_post(3, "quiet"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(3), "create", &deps).await.unwrap();

    assert_eq!(report_json(&report), json!({"skipped": "sync_disabled"}));
    assert_eq!(test.federation.calls().len(), 1);
    assert_eq!(test.twitter.call_count(), 0);
}

#[tokio::test]
async fn missing_post_is_skipped() {
    let test = linked();
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(404), "delete", &deps).await.unwrap();

    assert_eq!(report_json(&report), json!({"skipped": "post_not_found"}));
}

#[tokio::test]
async fn deleted_post_is_not_created_but_can_be_deleted() {
    let test = linked();
    test.store
        .insert_platform_ref(PostId(9), Platform::Twitter, twitter_ref("900"));
    let mut post = text_post(9, "gone");
    post.is_deleted = true;
    test.posts.insert(post);
    let deps = test.deps();

    let created = sync_event(ACTOR, PostId(9), "create", &deps).await.unwrap();
    assert_eq!(
        report_json(&created)["results"]["twitter"],
        json!({"skipped": "post_deleted"})
    );

    let deleted = sync_event(ACTOR, PostId(9), "delete", &deps).await.unwrap();
    assert_eq!(report_json(&deleted)["results"]["twitter"], json!({"applied": "deleted"}));
    assert_eq!(
        test.twitter.calls(),
        vec![TwitterCall::DeleteTweet {
            tweet_id: "900".into()
        }]
    );
    assert!(test.store.platform_ref(PostId(9), Platform::Twitter).is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn permanent_failure_is_isolated() {
    let test = linked();
    test.posts.insert(text_post(11, "hello"));
    test.twitter
        .fail_next(403, "Forbidden: You are not permitted to perform this action.");
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(11), "create", &deps).await.unwrap();

    let json = report_json(&report);
    assert_eq!(
        json["results"]["twitter"],
        json!({"error": "Forbidden: You are not permitted to perform this action."})
    );
    assert!(json["results"]["bluesky"]["uri"].is_string());
    assert!(test.store.platform_ref(PostId(11), Platform::Twitter).is_none());
    assert!(test.store.platform_ref(PostId(11), Platform::Bluesky).is_some());
}

#[tokio::test]
async fn retryable_failure_is_raised_and_retry_skips_done_platforms() {
    let test = linked();
    test.posts.insert(text_post(12, "hello"));
    test.twitter.fail_next(503, "Service Unavailable");
    let deps = test.deps();

    let err = sync_event(ACTOR, PostId(12), "create", &deps)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    match &err {
        SyncError::Retryable(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].platform, Platform::Twitter);
            assert_eq!(failures[0].status, Some(503));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let audit = test.store.last_audit(PostId(12)).expect("audit written");
    assert!(audit.retryable);
    assert!(audit.report.0["results"]["bluesky"]["uri"].is_string());

    let retried = sync_event(ACTOR, PostId(12), "create", &deps).await.unwrap();
    assert_eq!(report_json(&retried)["results"]["twitter"], json!({"id": "101"}));
    assert_eq!(
        report_json(&retried)["results"]["bluesky"],
        json!({"skipped": "already_synced"})
    );
    assert_eq!(test.twitter.created_tweets().len(), 2);
    assert_eq!(test.bluesky.created_records(POST_COLLECTION).len(), 1);
    assert!(!test.store.last_audit(PostId(12)).unwrap().retryable);
}

#[tokio::test]
async fn invalid_event_fails_fast() {
    let test = linked();
    let deps = test.deps();

    let err = sync_event(ACTOR, PostId(1), "repost", &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidEvent(ref e) if e == "repost"));
    assert!(!err.is_retryable());
    assert!(test.federation.calls().is_empty());
}

#[tokio::test]
async fn federation_failure_does_not_affect_sync() {
    let test = linked();
    test.federation.fail();
    test.posts.insert(text_post(13, "hello"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(13), "create", &deps).await.unwrap();

    assert!(report.result(Platform::Twitter).is_some());
    assert_eq!(test.twitter.created_tweets().len(), 1);
}

#[tokio::test]
async fn audit_failure_does_not_change_outcome() {
    let test = linked();
    test.store.fail_audit();
    test.posts.insert(text_post(14, "hello"));
    let deps = test.deps();

    let report = sync_event(ACTOR, PostId(14), "create", &deps).await.unwrap();

    assert_eq!(report_json(&report)["results"]["twitter"], json!({"id": "101"}));
    assert!(test.store.audits().is_empty());
}

#[tokio::test]
async fn settings_outage_is_retryable() {
    let test = linked();
    test.store.fail_settings();
    let deps = test.deps();

    let err = sync_event(ACTOR, PostId(1), "create", &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Internal(_)));
    assert!(err.is_retryable());
}
