use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{PostId, UserId};

/// Last sync event and its outcome, one row per post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncAuditEntry {
    pub post_id: PostId,
    pub actor_id: UserId,
    pub event: String,
    pub report: Json<serde_json::Value>,
    /// Whether the job was handed back to the queue for another attempt.
    pub retryable: bool,
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - target: post_sync_audits
// =============================================================================

impl SyncAuditEntry {
    pub async fn upsert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO post_sync_audits (post_id, actor_id, event, report, retryable, recorded_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (post_id) DO UPDATE SET
                actor_id = EXCLUDED.actor_id,
                event = EXCLUDED.event,
                report = EXCLUDED.report,
                retryable = EXCLUDED.retryable,
                recorded_at = EXCLUDED.recorded_at",
        )
        .bind(self.post_id)
        .bind(self.actor_id)
        .bind(&self.event)
        .bind(&self.report)
        .bind(self.retryable)
        .bind(self.recorded_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_post(post_id: PostId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT post_id, actor_id, event, report, retryable, recorded_at
             FROM post_sync_audits
             WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
