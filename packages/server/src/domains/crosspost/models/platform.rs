use anyhow::Result;
use serde::{Deserialize, Serialize};

/// External platforms a post can be mirrored to.
///
/// The lowercase name is the key used at rest (ref store, credentials) and in
/// sync reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Bluesky,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Twitter, Platform::Bluesky];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Bluesky => "bluesky",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "twitter" => Ok(Platform::Twitter),
            "bluesky" => Ok(Platform::Bluesky),
            _ => Err(anyhow::anyhow!("Invalid platform: {}", s)),
        }
    }
}

/// A home-platform action to mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEvent {
    Create,
    Reply,
    Quote,
    Delete,
    Like,
    Unlike,
    Bookmark,
    Unbookmark,
}

impl SyncEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncEvent::Create => "create",
            SyncEvent::Reply => "reply",
            SyncEvent::Quote => "quote",
            SyncEvent::Delete => "delete",
            SyncEvent::Like => "like",
            SyncEvent::Unlike => "unlike",
            SyncEvent::Bookmark => "bookmark",
            SyncEvent::Unbookmark => "unbookmark",
        }
    }

    /// create, reply and quote all mean "make sure the remote post exists".
    pub fn publishes(&self) -> bool {
        matches!(self, SyncEvent::Create | SyncEvent::Reply | SyncEvent::Quote)
    }
}

impl std::fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(SyncEvent::Create),
            "reply" => Ok(SyncEvent::Reply),
            "quote" => Ok(SyncEvent::Quote),
            "delete" => Ok(SyncEvent::Delete),
            "like" => Ok(SyncEvent::Like),
            "unlike" => Ok(SyncEvent::Unlike),
            "bookmark" => Ok(SyncEvent::Bookmark),
            "unbookmark" => Ok(SyncEvent::Unbookmark),
            _ => Err(anyhow::anyhow!("Invalid sync event: {}", s)),
        }
    }
}

/// Reversible actions a user takes against someone's post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Like,
    Bookmark,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Bookmark => "bookmark",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
