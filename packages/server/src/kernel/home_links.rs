use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::{BaseEntityReader, BaseLinkResolver, BasePostReader, LinkPreview};
use crate::common::utils::{asset_url, plain_text, truncate_chars};
use crate::common::PostId;
use crate::domains::crosspost::models::{Embed, EntitySummary};

/// Longest post excerpt shown as a card description.
const EXCERPT_CHARS: usize = 200;

/// Resolves embeds to public home URLs with card metadata.
///
/// A home entity that cannot be found, or whose lookup fails, still yields
/// its URL with no title.
pub struct HomeLinkResolver {
    base_url: String,
    asset_base_url: String,
    posts: Arc<dyn BasePostReader>,
    entities: Arc<dyn BaseEntityReader>,
}

impl HomeLinkResolver {
    pub fn new(
        base_url: impl Into<String>,
        asset_base_url: impl Into<String>,
        posts: Arc<dyn BasePostReader>,
        entities: Arc<dyn BaseEntityReader>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            asset_base_url: asset_base_url.into(),
            posts,
            entities,
        }
    }

    fn url(&self, kind: &str, id: impl std::fmt::Display) -> String {
        format!("{}/{}/{}", self.base_url, kind, id)
    }

    /// Author as title, body excerpt as description, first image as thumb.
    async fn post_summary(&self, post_id: PostId) -> Result<Option<EntitySummary>> {
        let Some(post) = self.posts.get_post(post_id).await? else {
            return Ok(None);
        };
        if post.is_deleted {
            return Ok(None);
        }

        let title = match self.entities.get_user(post.author_id).await? {
            Some(author) => format!("Post by {}", author.title),
            None => "Post".to_string(),
        };
        let excerpt = truncate_chars(&plain_text(post.content.as_deref()), EXCERPT_CHARS);

        Ok(Some(EntitySummary {
            title,
            description: (!excerpt.is_empty()).then_some(excerpt),
            image: post.media.into_iter().find(|m| m.is_image()),
        }))
    }

    fn card(&self, url: String, summary: EntitySummary) -> LinkPreview {
        LinkPreview {
            url,
            title: Some(summary.title),
            description: summary.description,
            thumbnail_url: summary
                .image
                .map(|m| asset_url(&self.asset_base_url, &m.content_hash, &m.extension)),
        }
    }
}

#[async_trait]
impl BaseLinkResolver for HomeLinkResolver {
    async fn resolve(&self, embed: &Embed) -> Result<Option<LinkPreview>> {
        let (url, summary) = match embed {
            Embed::None => return Ok(None),
            Embed::Url {
                url,
                title,
                description,
                thumbnail,
            } => {
                return Ok(Some(LinkPreview {
                    url: url.clone(),
                    title: title.clone(),
                    description: description.clone(),
                    thumbnail_url: thumbnail.clone(),
                }))
            }
            Embed::Post { post_id } => (self.url("posts", post_id), self.post_summary(*post_id).await),
            Embed::User { user_id } => (self.url("users", user_id), self.entities.get_user(*user_id).await),
            Embed::Project { project_id } => (
                self.url("projects", project_id),
                self.entities.get_project(*project_id).await,
            ),
            Embed::List { list_id } => (self.url("lists", list_id), self.entities.get_list(*list_id).await),
        };

        let preview = match summary {
            Ok(Some(summary)) => self.card(url, summary),
            Ok(None) => LinkPreview {
                url,
                ..Default::default()
            },
            Err(e) => {
                warn!(url = %url, error = %e, "Link card lookup failed, linking without metadata");
                LinkPreview {
                    url,
                    ..Default::default()
                }
            }
        };
        Ok(Some(preview))
    }
}
