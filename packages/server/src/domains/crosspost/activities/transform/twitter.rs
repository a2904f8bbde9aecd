use anyhow::Result;

use super::{embed_preview, media_urls};
use crate::common::utils::{plain_text, truncate_chars};
use crate::domains::crosspost::models::Post;
use crate::kernel::BaseLinkResolver;

pub const TWEET_MAX_CHARS: usize = 280;

/// Every URL counts as a shortened link of this length, whatever its size.
pub const TWEET_LINK_WEIGHT: usize = 23;

/// Tweet text for a post: its body followed by bare links to the embed and
/// each media asset.
pub async fn tweet_text(
    post: &Post,
    links: &dyn BaseLinkResolver,
    asset_base_url: &str,
) -> Result<String> {
    let mut urls = Vec::new();
    if let Some(preview) = embed_preview(post, links).await? {
        urls.push(preview.url);
    }
    urls.extend(media_urls(post, asset_base_url));

    Ok(compose_tweet_text(&plain_text(post.content.as_deref()), &urls))
}

/// Join body and links, truncating the body so the weighted total stays
/// within the tweet limit.
pub fn compose_tweet_text(body: &str, links: &[String]) -> String {
    let reserved = links.len() * (TWEET_LINK_WEIGHT + 1);
    let body = truncate_chars(body, TWEET_MAX_CHARS.saturating_sub(reserved));

    let mut parts: Vec<&str> = Vec::with_capacity(links.len() + 1);
    if !body.is_empty() {
        parts.push(&body);
    }
    parts.extend(links.iter().map(String::as_str));
    parts.join(" ")
}
