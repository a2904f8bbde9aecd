//! Result shapes of a sync job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Platform, PlatformRef};

/// Why nothing was done. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The actor has no platform enabled.
    SyncDisabled,
    PostNotFound,
    /// A create found a ref already present.
    AlreadySynced,
    /// A delete found no ref to remove.
    NotSynced,
    /// A parent, thread root, quoted or retweeted post was never synced.
    MissingTargetRef,
    /// An engagement (or its reversal) found nothing to act on.
    MissingRef,
    /// A create arrived for a post that is already soft-deleted.
    PostDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedAction {
    Deleted,
    Liked,
    Unliked,
    Bookmarked,
    Unbookmarked,
}

/// What happened on one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlatformOutcome {
    /// A remote post or repost was created; carries its new ref.
    Posted(PlatformRef),
    Applied { applied: AppliedAction },
    Skipped { skipped: SkipReason },
    /// Permanent failure, with the platform's own explanation.
    Failed { error: String },
}

impl PlatformOutcome {
    pub fn posted(r: impl Into<PlatformRef>) -> Self {
        PlatformOutcome::Posted(r.into())
    }

    pub fn applied(action: AppliedAction) -> Self {
        PlatformOutcome::Applied { applied: action }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        PlatformOutcome::Skipped { skipped: reason }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        PlatformOutcome::Failed {
            error: message.into(),
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            PlatformOutcome::Skipped { skipped } => Some(*skipped),
            _ => None,
        }
    }
}

/// Result of one `sync_event` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyncReport {
    /// Nothing was attempted on any platform.
    Skipped { skipped: SkipReason },
    Completed {
        results: BTreeMap<Platform, PlatformOutcome>,
    },
}

impl SyncReport {
    pub fn result(&self, platform: Platform) -> Option<&PlatformOutcome> {
        match self {
            SyncReport::Completed { results } => results.get(&platform),
            SyncReport::Skipped { .. } => None,
        }
    }
}

/// A retryable failure on one platform, carried by the aggregated error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformFailure {
    pub platform: Platform,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl std::fmt::Display for PlatformFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.platform, status, self.message),
            None => write!(f, "{}: {}", self.platform, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::crosspost::models::TwitterRef;
    use serde_json::json;

    #[test]
    fn test_report_shapes() {
        let mut results = BTreeMap::new();
        results.insert(Platform::Twitter, PlatformOutcome::posted(TwitterRef::tweet("101")));
        results.insert(
            Platform::Bluesky,
            PlatformOutcome::skipped(SkipReason::MissingTargetRef),
        );
        let report = SyncReport::Completed { results };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "results": {
                    "twitter": {"id": "101"},
                    "bluesky": {"skipped": "missing_target_ref"}
                }
            })
        );

        let skipped = SyncReport::Skipped {
            skipped: SkipReason::SyncDisabled,
        };
        assert_eq!(serde_json::to_value(&skipped).unwrap(), json!({"skipped": "sync_disabled"}));
    }

    #[test]
    fn test_applied_and_failed_shapes() {
        assert_eq!(
            serde_json::to_value(PlatformOutcome::applied(AppliedAction::Unliked)).unwrap(),
            json!({"applied": "unliked"})
        );
        assert_eq!(
            serde_json::to_value(PlatformOutcome::failed("Forbidden")).unwrap(),
            json!({"error": "Forbidden"})
        );
    }
}
