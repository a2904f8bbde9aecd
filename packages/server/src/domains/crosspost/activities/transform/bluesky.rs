//! Bluesky post records: text with facets, reply refs, and one embed.
//!
//! The embed is at most one of: an image gallery, an external link card, a
//! quoted record, or a quoted record together with a gallery or card.

use anyhow::{Context, Result};
use bluesky_client::{StrongRef, POST_COLLECTION};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use super::facets::{build_facets, truncate_outside_spans};
use super::{embed_preview, media_url};
use crate::common::utils::plain_text;
use crate::domains::crosspost::models::Post;
use crate::kernel::{BaseBlueskyApi, BaseLinkResolver, BaseMediaFetcher, LinkPreview};

pub const POST_MAX_CHARS: usize = 300;
pub const MAX_IMAGES: usize = 4;
pub const MAX_IMAGE_BYTES: usize = 1_000_000;

/// Both ends of a reply thread; Bluesky requires the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRefs {
    pub root: StrongRef,
    pub parent: StrongRef,
}

/// Renders posts for one authenticated session.
pub struct BlueskyRenderer<'a> {
    pub api: &'a dyn BaseBlueskyApi,
    pub access_jwt: &'a str,
    pub links: &'a dyn BaseLinkResolver,
    pub media: &'a dyn BaseMediaFetcher,
    pub asset_base_url: &'a str,
}

impl<'a> BlueskyRenderer<'a> {
    /// Build an `app.bsky.feed.post` record. Images are uploaded as blobs on
    /// the way.
    pub async fn render(
        &self,
        post: &Post,
        reply: Option<&ReplyRefs>,
        quote: Option<&StrongRef>,
        now: DateTime<Utc>,
    ) -> Result<Value> {
        let body = plain_text(post.content.as_deref());
        let images = self.upload_images(post).await?;
        let preview = embed_preview(post, self.links).await?;

        let (text, media_embed) = if !images.is_empty() {
            // Gallery wins; keep the link in the text instead
            let text = match &preview {
                Some(p) => append_link(&body, &p.url),
                None => truncate_outside_spans(&body, POST_MAX_CHARS),
            };
            let gallery = json!({
                "$type": "app.bsky.embed.images",
                "images": images,
            });
            (text, Some(gallery))
        } else {
            let card = match &preview {
                Some(p) => Some(self.external_card(p).await),
                None => None,
            };
            (truncate_outside_spans(&body, POST_MAX_CHARS), card)
        };

        let mut record = Map::new();
        record.insert("$type".into(), json!(POST_COLLECTION));
        record.insert("text".into(), json!(text));
        record.insert("createdAt".into(), json!(now.to_rfc3339()));

        let facets = build_facets(&text, self.api).await?;
        if !facets.is_empty() {
            record.insert("facets".into(), Value::Array(facets));
        }

        if let Some(reply) = reply {
            record.insert(
                "reply".into(),
                json!({"root": reply.root, "parent": reply.parent}),
            );
        }

        let embed = match (quote, media_embed) {
            (Some(quoted), Some(media)) => Some(json!({
                "$type": "app.bsky.embed.recordWithMedia",
                "record": {"$type": "app.bsky.embed.record", "record": quoted},
                "media": media,
            })),
            (Some(quoted), None) => Some(json!({
                "$type": "app.bsky.embed.record",
                "record": quoted,
            })),
            (None, media) => media,
        };
        if let Some(embed) = embed {
            record.insert("embed".into(), embed);
        }

        Ok(Value::Object(record))
    }

    async fn upload_images(&self, post: &Post) -> Result<Vec<Value>> {
        let mut images = Vec::new();

        for media in post.media.iter().filter(|m| m.is_image()).take(MAX_IMAGES) {
            let url = media_url(media, self.asset_base_url);
            let fetched = self
                .media
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch image {}", url))?;

            if fetched.bytes.len() > MAX_IMAGE_BYTES {
                tracing::warn!(
                    post_id = %post.id,
                    url = %url,
                    size = fetched.bytes.len(),
                    "Image too large for Bluesky, skipping"
                );
                continue;
            }

            let blob = self
                .api
                .upload_blob(self.access_jwt, fetched.bytes, &media.mime_type_or_guess())
                .await
                .with_context(|| format!("Failed to upload image {}", url))?;

            images.push(json!({
                "alt": media.alt.clone().unwrap_or_default(),
                "image": blob,
            }));
        }

        Ok(images)
    }

    async fn external_card(&self, preview: &LinkPreview) -> Value {
        let mut external = json!({
            "uri": preview.url,
            "title": preview.title.clone().unwrap_or_default(),
            "description": preview.description.clone().unwrap_or_default(),
        });

        if let Some(thumb_url) = &preview.thumbnail_url {
            match self.upload_thumbnail(thumb_url).await {
                Ok(blob) => external["thumb"] = blob,
                Err(e) => {
                    tracing::warn!(url = %thumb_url, error = %e, "Dropping link card thumbnail")
                }
            }
        }

        json!({
            "$type": "app.bsky.embed.external",
            "external": external,
        })
    }

    async fn upload_thumbnail(&self, url: &str) -> Result<Value> {
        let fetched = self.media.fetch(url).await?;
        if fetched.bytes.len() > MAX_IMAGE_BYTES {
            anyhow::bail!("thumbnail is {} bytes", fetched.bytes.len());
        }
        self.api
            .upload_blob(self.access_jwt, fetched.bytes, &fetched.mime_type)
            .await
    }
}

/// Body truncated to leave room for ` {url}`, then the url.
fn append_link(body: &str, url: &str) -> String {
    let room = POST_MAX_CHARS.saturating_sub(url.chars().count() + 1);
    let body = truncate_outside_spans(body, room);
    if body.is_empty() {
        url.to_string()
    } else {
        format!("{} {}", body, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PostId, UserId};
    use crate::common::utils::ELLIPSIS;
    use crate::domains::crosspost::models::{Embed, EntitySummary, MediaRef};
    use crate::kernel::test_dependencies::{BlueskyCall, MockBlueskyApi, MockMediaFetcher};
    use crate::kernel::TestDependencies;

    fn image(hash: &str) -> MediaRef {
        MediaRef {
            content_hash: hash.into(),
            extension: "png".into(),
            mime_type: Some("image/png".into()),
            alt: Some(format!("alt {}", hash)),
        }
    }

    fn quoted() -> StrongRef {
        StrongRef {
            uri: "at://did:plc:q/app.bsky.feed.post/1".into(),
            cid: "bafyq".into(),
        }
    }

    async fn render(
        post: &Post,
        api: &MockBlueskyApi,
        media: &MockMediaFetcher,
        reply: Option<&ReplyRefs>,
        quote: Option<&StrongRef>,
    ) -> Value {
        let links = TestDependencies::new().link_resolver();
        render_with_links(post, api, media, &links, reply, quote).await
    }

    async fn render_with_links(
        post: &Post,
        api: &MockBlueskyApi,
        media: &MockMediaFetcher,
        links: &dyn BaseLinkResolver,
        reply: Option<&ReplyRefs>,
        quote: Option<&StrongRef>,
    ) -> Value {
        let renderer = BlueskyRenderer {
            api,
            access_jwt: "jwt",
            links,
            media,
            asset_base_url: "https://assets.test",
        };
        renderer.render(post, reply, quote, Utc::now()).await.unwrap()
    }

    #[tokio::test]
    async fn test_gallery_caps_at_four_and_keeps_link_in_text() {
        let post = Post::builder()
            .id(PostId(1))
            .author_id(UserId(1))
            .content("pics")
            .embed(Embed::Url {
                url: "https://example.org".into(),
                title: Some("Example".into()),
                description: None,
                thumbnail: None,
            })
            .media(vec![
                image("aa11"),
                image("bb22"),
                image("cc33"),
                image("dd44"),
                image("ee55"),
            ])
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new();

        let record = render(&post, &api, &media, None, None).await;

        assert_eq!(record["embed"]["$type"], "app.bsky.embed.images");
        assert_eq!(record["embed"]["images"].as_array().unwrap().len(), 4);
        assert_eq!(record["embed"]["images"][0]["alt"], "alt aa11");
        assert_eq!(record["text"], "pics https://example.org");
        assert_eq!(record["facets"][0]["features"][0]["uri"], "https://example.org");
        assert_eq!(media.calls().len(), 4);
        assert_eq!(media.calls()[0], "https://assets.test/aa/11/aa11.png");
    }

    #[tokio::test]
    async fn test_oversized_image_is_skipped() {
        let post = Post::builder()
            .id(PostId(1))
            .author_id(UserId(1))
            .content("big")
            .media(vec![image("aa11"), image("bb22")])
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new().with_media(
            "https://assets.test/aa/11/aa11.png",
            vec![0; MAX_IMAGE_BYTES + 1],
            "image/png",
        );

        let record = render(&post, &api, &media, None, None).await;

        assert_eq!(record["embed"]["images"].as_array().unwrap().len(), 1);
        assert_eq!(record["embed"]["images"][0]["alt"], "alt bb22");
        let uploads = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, BlueskyCall::UploadBlob { .. }))
            .count();
        assert_eq!(uploads, 1);
    }

    #[tokio::test]
    async fn test_link_card_with_thumbnail() {
        let post = Post::builder()
            .id(PostId(1))
            .author_id(UserId(1))
            .content("read this")
            .embed(Embed::Url {
                url: "https://example.org/a".into(),
                title: Some("A".into()),
                description: Some("About A".into()),
                thumbnail: Some("https://example.org/a.jpg".into()),
            })
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new();

        let record = render(&post, &api, &media, None, None).await;

        let external = &record["embed"]["external"];
        assert_eq!(record["embed"]["$type"], "app.bsky.embed.external");
        assert_eq!(external["uri"], "https://example.org/a");
        assert_eq!(external["title"], "A");
        assert_eq!(external["description"], "About A");
        assert_eq!(external["thumb"]["$type"], "blob");
        assert_eq!(record["text"], "read this");
    }

    #[tokio::test]
    async fn test_thumbnail_failure_keeps_card() {
        let post = Post::builder()
            .id(PostId(1))
            .author_id(UserId(1))
            .content("read this")
            .embed(Embed::Url {
                url: "https://example.org/a".into(),
                title: None,
                description: None,
                thumbnail: Some("https://example.org/a.jpg".into()),
            })
            .build();
        let api = MockBlueskyApi::new();
        api.fail_next(500, None, "blob store down");
        let media = MockMediaFetcher::new();

        let record = render(&post, &api, &media, None, None).await;

        assert_eq!(record["embed"]["external"]["uri"], "https://example.org/a");
        assert!(record["embed"]["external"].get("thumb").is_none());
    }

    #[tokio::test]
    async fn test_quote_with_card_uses_record_with_media() {
        let post = Post::builder()
            .id(PostId(2))
            .author_id(UserId(1))
            .content("quoting")
            .quoted_post_id(PostId(1))
            .embed(Embed::User { user_id: UserId(5) })
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new();
        let q = quoted();

        let record = render(&post, &api, &media, None, Some(&q)).await;

        assert_eq!(record["embed"]["$type"], "app.bsky.embed.recordWithMedia");
        assert_eq!(record["embed"]["record"]["record"]["uri"], q.uri);
        assert_eq!(record["embed"]["media"]["external"]["uri"], "https://home.test/users/5");
    }

    #[tokio::test]
    async fn test_plain_quote_and_reply_refs() {
        let post = Post::builder()
            .id(PostId(2))
            .author_id(UserId(1))
            .content("yes")
            .quoted_post_id(PostId(1))
            .embed(Embed::Post { post_id: PostId(1) })
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new();
        let q = quoted();
        let reply = ReplyRefs {
            root: q.clone(),
            parent: q.clone(),
        };

        let record = render(&post, &api, &media, Some(&reply), Some(&q)).await;

        assert_eq!(record["embed"]["$type"], "app.bsky.embed.record");
        assert_eq!(record["embed"]["record"]["cid"], "bafyq");
        assert_eq!(record["reply"]["root"]["uri"], q.uri);
        assert_eq!(record["reply"]["parent"]["cid"], "bafyq");
        assert!(record.get("facets").is_none());
    }

    #[tokio::test]
    async fn test_truncated_link_is_dropped_not_faceted() {
        let body = format!("{} https://example.org/some/long/path", "a".repeat(290));
        let post = Post::builder()
            .id(PostId(1))
            .author_id(UserId(1))
            .content(body)
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new();

        let record = render(&post, &api, &media, None, None).await;

        assert_eq!(record["text"], format!("{}{}", "a".repeat(290), ELLIPSIS));
        assert!(record.get("facets").is_none());
    }

    #[tokio::test]
    async fn test_home_post_card_carries_metadata_and_thumb() {
        let deps = TestDependencies::new();
        deps.entities.insert_user(
            UserId(3),
            EntitySummary {
                title: "Ada (@ada)".into(),
                ..Default::default()
            },
        );
        deps.posts.insert(
            Post::builder()
                .id(PostId(7))
                .author_id(UserId(3))
                .content("Seed swap this Sunday")
                .media(vec![image("abcd")])
                .build(),
        );
        let post = Post::builder()
            .id(PostId(8))
            .author_id(UserId(1))
            .content("worth a look")
            .embed(Embed::Post { post_id: PostId(7) })
            .build();
        let api = MockBlueskyApi::new();
        let media = MockMediaFetcher::new();
        let links = deps.link_resolver();

        let record = render_with_links(&post, &api, &media, &links, None, None).await;

        let external = &record["embed"]["external"];
        assert_eq!(record["embed"]["$type"], "app.bsky.embed.external");
        assert_eq!(external["uri"], "https://home.test/posts/7");
        assert_eq!(external["title"], "Post by Ada (@ada)");
        assert_eq!(external["description"], "Seed swap this Sunday");
        assert_eq!(external["thumb"]["$type"], "blob");
        assert_eq!(media.calls(), vec!["https://assets.test/ab/cd/abcd.png".to_string()]);
    }

    #[test]
    fn test_append_link_keeps_whole_url() {
        let url = "https://example.org/some/long/path";
        let text = append_link(&"y".repeat(500), url);
        assert_eq!(text.chars().count(), POST_MAX_CHARS);
        assert!(text.ends_with(url));
    }
}
