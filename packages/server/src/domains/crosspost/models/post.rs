use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{ListId, PostId, ProjectId, UserId};

/// Read-only snapshot of a home post, as loaded for one sync job.
///
/// The post itself is owned by the posts collaborator; this engine never
/// writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    #[builder(default)]
    pub post_type: PostType,
    /// Null for retweets.
    #[builder(default, setter(strip_option, into))]
    pub content: Option<String>,
    #[builder(default)]
    pub embed: Embed,
    /// Ordered as the author attached them.
    #[builder(default)]
    pub media: Vec<MediaRef>,
    #[builder(default, setter(strip_option))]
    pub in_reply_to_id: Option<PostId>,
    #[builder(default, setter(strip_option))]
    pub thread_root_id: Option<PostId>,
    #[builder(default, setter(strip_option))]
    pub quoted_post_id: Option<PostId>,
    #[builder(default, setter(strip_option))]
    pub retweet_of_id: Option<PostId>,
    #[builder(default)]
    pub is_deleted: bool,
}

impl Post {
    /// The post that likes and bookmarks land on. Engaging with a home retweet
    /// engages with the retweeted post.
    pub fn engagement_target(&self) -> PostId {
        match (self.post_type, self.retweet_of_id) {
            (PostType::Retweet, Some(original)) => original,
            _ => self.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    #[default]
    Normal,
    Reply,
    Quote,
    Retweet,
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostType::Normal => write!(f, "normal"),
            PostType::Reply => write!(f, "reply"),
            PostType::Quote => write!(f, "quote"),
            PostType::Retweet => write!(f, "retweet"),
        }
    }
}

impl std::str::FromStr for PostType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(PostType::Normal),
            "reply" => Ok(PostType::Reply),
            "quote" => Ok(PostType::Quote),
            "retweet" => Ok(PostType::Retweet),
            _ => Err(anyhow::anyhow!("Invalid post type: {}", s)),
        }
    }
}

/// What a post embeds besides its media.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Embed {
    #[default]
    None,
    Post {
        post_id: PostId,
    },
    User {
        user_id: UserId,
    },
    Project {
        project_id: ProjectId,
    },
    List {
        list_id: ListId,
    },
    Url {
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        /// Thumbnail image URL.
        #[serde(default)]
        thumbnail: Option<String>,
    },
}

impl Embed {
    pub fn is_none(&self) -> bool {
        matches!(self, Embed::None)
    }
}

/// A media attachment, addressed by content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MediaRef {
    pub content_hash: String,
    pub extension: String,
    pub mime_type: Option<String>,
    pub alt: Option<String>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Image types both platforms accept for upload.
const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

impl MediaRef {
    pub fn is_image(&self) -> bool {
        match &self.mime_type {
            Some(mime) => IMAGE_MIME_TYPES.contains(&mime.trim().to_ascii_lowercase().as_str()),
            None => IMAGE_EXTENSIONS.contains(&self.extension.to_ascii_lowercase().as_str()),
        }
    }

    /// Declared mime type, or one guessed from the extension.
    pub fn mime_type_or_guess(&self) -> String {
        if let Some(mime) = &self.mime_type {
            return mime.clone();
        }
        match self.extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg".to_string(),
            "png" => "image/png".to_string(),
            "gif" => "image/gif".to_string(),
            "webp" => "image/webp".to_string(),
            "mp4" => "video/mp4".to_string(),
            _ => "application/octet-stream".to_string(),
        }
    }
}

// =============================================================================
// SQL Queries - target: posts p, post_media m (owned by the posts collaborator)
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: PostId,
    author_id: UserId,
    post_type: String,
    content: Option<String>,
    embed: Option<Json<Embed>>,
    in_reply_to_id: Option<PostId>,
    thread_root_id: Option<PostId>,
    quoted_post_id: Option<PostId>,
    retweet_post_id: Option<PostId>,
    is_deleted: bool,
}

impl Post {
    /// Load a post with its media. Soft-deleted posts are returned too, so a
    /// delete can still be mirrored.
    pub async fn find_by_id(id: PostId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, author_id, post_type, content, embed, in_reply_to_id, thread_root_id,
                    quoted_post_id, retweet_post_id, is_deleted
             FROM posts
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let media = sqlx::query_as::<_, MediaRef>(
            "SELECT content_hash, extension, mime_type, alt_text AS alt
             FROM post_media
             WHERE post_id = $1
             ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let post_type = row
            .post_type
            .parse()
            .with_context(|| format!("post {} has an unknown post_type", row.id))?;

        Ok(Some(Post {
            id: row.id,
            author_id: row.author_id,
            post_type,
            content: row.content,
            embed: row.embed.map(|Json(e)| e).unwrap_or_default(),
            media,
            in_reply_to_id: row.in_reply_to_id,
            thread_root_id: row.thread_root_id,
            quoted_post_id: row.quoted_post_id,
            retweet_of_id: row.retweet_post_id,
            is_deleted: row.is_deleted,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embed_is_tagged_by_type() {
        let embed: Embed = serde_json::from_value(json!({
            "type": "url",
            "url": "https://example.org/a",
            "title": "A page"
        }))
        .unwrap();
        assert_eq!(
            embed,
            Embed::Url {
                url: "https://example.org/a".to_string(),
                title: Some("A page".to_string()),
                description: None,
                thumbnail: None,
            }
        );

        let embed: Embed = serde_json::from_value(json!({"type": "user", "user_id": 9})).unwrap();
        assert_eq!(embed, Embed::User { user_id: UserId(9) });

        let none: Embed = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_engagement_target_follows_retweets() {
        let retweet = Post::builder()
            .id(PostId(5))
            .author_id(UserId(1))
            .post_type(PostType::Retweet)
            .retweet_of_id(PostId(4))
            .build();
        assert_eq!(retweet.engagement_target(), PostId(4));

        let normal = Post::builder().id(PostId(6)).author_id(UserId(1)).build();
        assert_eq!(normal.engagement_target(), PostId(6));
    }

    #[test]
    fn test_media_image_detection() {
        let png = MediaRef {
            content_hash: "ab".into(),
            extension: "PNG".into(),
            mime_type: None,
            alt: None,
        };
        assert!(png.is_image());
        assert_eq!(png.mime_type_or_guess(), "image/png");

        let video = MediaRef {
            content_hash: "cd".into(),
            extension: "mp4".into(),
            mime_type: Some("video/mp4".into()),
            alt: None,
        };
        assert!(!video.is_image());
    }

    #[test]
    fn test_unsupported_image_types_are_not_images() {
        let with_mime = |mime: &str, extension: &str| MediaRef {
            content_hash: "ef".into(),
            extension: extension.into(),
            mime_type: Some(mime.into()),
            alt: None,
        };

        assert!(!with_mime("image/svg+xml", "svg").is_image());
        assert!(!with_mime("image/heic", "heic").is_image());
        assert!(!with_mime("image/tiff", "tif").is_image());
        assert!(with_mime("IMAGE/JPEG", "jpg").is_image());
        assert!(with_mime("image/webp", "webp").is_image());
    }
}
