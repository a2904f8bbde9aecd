//! Read-only summaries of home users, projects and lists, as shown on link
//! cards. The rows belong to their own services.

use anyhow::Result;
use sqlx::PgPool;

use super::MediaRef;
use crate::common::{ListId, ProjectId, UserId};

/// Title, blurb and image of a home entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntitySummary {
    pub title: String,
    pub description: Option<String>,
    /// Avatar or cover image, addressed in the asset store.
    pub image: Option<MediaRef>,
}

/// `Display Name (@handle)`, or just `@handle` without a display name.
pub fn user_title(display_name: Option<&str>, username: &str) -> String {
    match display_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{} (@{})", name, username),
        None => format!("@{}", username),
    }
}

fn stored_image(hash: Option<String>, extension: Option<String>) -> Option<MediaRef> {
    match (hash, extension) {
        (Some(content_hash), Some(extension)) => Some(MediaRef {
            content_hash,
            extension,
            mime_type: None,
            alt: None,
        }),
        _ => None,
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

// =============================================================================
// SQL Queries - target: users, projects, lists
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    username: String,
    display_name: Option<String>,
    bio: Option<String>,
    avatar_hash: Option<String>,
    avatar_extension: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct NamedRow {
    name: String,
    description: Option<String>,
    image_hash: Option<String>,
    image_extension: Option<String>,
}

impl From<NamedRow> for EntitySummary {
    fn from(row: NamedRow) -> Self {
        Self {
            title: row.name,
            description: non_empty(row.description),
            image: stored_image(row.image_hash, row.image_extension),
        }
    }
}

impl EntitySummary {
    pub async fn find_user(user_id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT username, display_name, bio, avatar_hash, avatar_extension
             FROM users
             WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|row| Self {
            title: user_title(row.display_name.as_deref(), &row.username),
            description: non_empty(row.bio),
            image: stored_image(row.avatar_hash, row.avatar_extension),
        }))
    }

    pub async fn find_project(project_id: ProjectId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, NamedRow>(
            "SELECT name, description, cover_hash AS image_hash, cover_extension AS image_extension
             FROM projects
             WHERE id = $1",
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn find_list(list_id: ListId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, NamedRow>(
            "SELECT name, description, NULL::TEXT AS image_hash, NULL::TEXT AS image_extension
             FROM lists
             WHERE id = $1",
        )
        .bind(list_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
