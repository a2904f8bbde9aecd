//! Content transformer: generic post -> platform-native payload.

pub mod bluesky;
pub mod facets;
pub mod twitter;

pub use bluesky::{BlueskyRenderer, ReplyRefs};
pub use twitter::{compose_tweet_text, tweet_text};

use anyhow::Result;

use crate::common::utils::asset_url;
use crate::domains::crosspost::models::{Embed, MediaRef, Post};
use crate::kernel::{BaseLinkResolver, LinkPreview};

pub fn media_url(media: &MediaRef, asset_base_url: &str) -> String {
    asset_url(asset_base_url, &media.content_hash, &media.extension)
}

/// Asset URLs of a post's media, in attachment order.
pub fn media_urls(post: &Post, asset_base_url: &str) -> Vec<String> {
    post.media
        .iter()
        .map(|m| media_url(m, asset_base_url))
        .collect()
}

/// Link target of the post's embed. An embed of the post's own quote target
/// is left out; the quote already shows it.
pub async fn embed_preview(post: &Post, links: &dyn BaseLinkResolver) -> Result<Option<LinkPreview>> {
    if let (Embed::Post { post_id }, Some(quoted)) = (&post.embed, post.quoted_post_id) {
        if *post_id == quoted {
            return Ok(None);
        }
    }
    links.resolve(&post.embed).await
}
