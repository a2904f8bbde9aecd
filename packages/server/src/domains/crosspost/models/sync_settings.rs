use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::Platform;
use crate::common::UserId;

/// Per-user switches for each platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncSettings {
    pub user_id: UserId,
    pub twitter_enabled: bool,
    pub bluesky_enabled: bool,
}

impl SyncSettings {
    pub fn is_enabled(&self, platform: Platform) -> bool {
        match platform {
            Platform::Twitter => self.twitter_enabled,
            Platform::Bluesky => self.bluesky_enabled,
        }
    }

    pub fn enabled_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }

    /// Settings for a user; users without a row have nothing enabled.
    pub async fn find_for_user(user_id: UserId, pool: &PgPool) -> Result<Self> {
        let found = sqlx::query_as::<_, Self>(
            "SELECT user_id, twitter_enabled, bluesky_enabled
             FROM user_sync_settings
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(found.unwrap_or(Self {
            user_id,
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_platforms_in_stable_order() {
        let settings = SyncSettings {
            user_id: UserId(1),
            twitter_enabled: true,
            bluesky_enabled: true,
        };
        assert_eq!(settings.enabled_platforms(), vec![Platform::Twitter, Platform::Bluesky]);

        let none = SyncSettings::default();
        assert!(none.enabled_platforms().is_empty());
    }
}
