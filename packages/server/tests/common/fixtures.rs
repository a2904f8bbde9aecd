//! Post and ref fixtures for sync tests.

use crosspost_core::common::{PostId, UserId};
use crosspost_core::domains::crosspost::models::{Post, PostType};
use crosspost_core::kernel::TestDependencies;
use serde_json::{json, Value};

pub const ACTOR: UserId = UserId(1);

/// Test dependencies with both platforms linked and enabled for `ACTOR`.
pub fn linked() -> TestDependencies {
    let test = TestDependencies::new();
    test.link_accounts(ACTOR);
    test
}

pub fn text_post(id: i64, content: &str) -> Post {
    Post::builder()
        .id(PostId(id))
        .author_id(ACTOR)
        .content(content)
        .build()
}

pub fn reply_post(id: i64, parent: i64, content: &str) -> Post {
    Post::builder()
        .id(PostId(id))
        .author_id(ACTOR)
        .post_type(PostType::Reply)
        .content(content)
        .in_reply_to_id(PostId(parent))
        .build()
}

pub fn quote_post(id: i64, quoted: i64, content: &str) -> Post {
    Post::builder()
        .id(PostId(id))
        .author_id(ACTOR)
        .post_type(PostType::Quote)
        .content(content)
        .quoted_post_id(PostId(quoted))
        .build()
}

pub fn retweet_post(id: i64, original: i64) -> Post {
    Post::builder()
        .id(PostId(id))
        .author_id(ACTOR)
        .post_type(PostType::Retweet)
        .retweet_of_id(PostId(original))
        .build()
}

pub fn twitter_ref(id: &str) -> Value {
    json!({ "id": id })
}

pub fn bluesky_ref(rkey: &str) -> Value {
    json!({
        "uri": format!("at://did:plc:someone/app.bsky.feed.post/{}", rkey),
        "cid": format!("bafy{}", rkey),
    })
}
