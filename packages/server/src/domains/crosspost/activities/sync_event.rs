//! Entry point for one queued sync job.

use anyhow::Context;
use chrono::Utc;
use futures::future::join_all;
use sqlx::types::Json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};

use super::adapters::adapter_for;
use super::classify::classify;
use crate::common::{PostId, UserId};
use crate::domains::crosspost::models::{
    Platform, PlatformFailure, PlatformOutcome, Post, SkipReason, SyncAuditEntry, SyncEvent,
    SyncReport,
};
use crate::kernel::{FederationRequest, SyncDeps};

/// Why a sync job did not complete.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync event: {0}")]
    InvalidEvent(String),

    /// At least one platform failed transiently; the whole event should be
    /// retried. Platforms that succeeded are skipped next time.
    #[error("Retryable platform failures: {}", describe(.0))]
    Retryable(Vec<PlatformFailure>),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SyncError {
    /// Whether the queue layer should re-enqueue the job.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::InvalidEvent(_) => false,
            SyncError::Retryable(_) | SyncError::Internal(_) => true,
        }
    }
}

fn describe(failures: &[PlatformFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Mirror one home action to every platform the actor has enabled.
///
/// Resolves with a report even when some platforms failed permanently; fails
/// with `SyncError::Retryable` when any platform failed transiently.
pub async fn sync_event(
    actor_id: UserId,
    post_id: PostId,
    event: &str,
    deps: &SyncDeps,
) -> Result<SyncReport, SyncError> {
    let event: SyncEvent = event
        .parse()
        .map_err(|_| SyncError::InvalidEvent(event.to_string()))?;

    let span = tracing::info_span!(
        "sync_event",
        actor_id = %actor_id,
        post_id = %post_id,
        event = %event
    );
    run(actor_id, post_id, event, deps).instrument(span).await
}

async fn run(
    actor_id: UserId,
    post_id: PostId,
    event: SyncEvent,
    deps: &SyncDeps,
) -> Result<SyncReport, SyncError> {
    federate(actor_id, post_id, event, deps).await;

    let platforms = deps
        .settings
        .enabled_platforms(actor_id)
        .await
        .context("Failed to load sync settings")?;
    if platforms.is_empty() {
        debug!("No platforms enabled");
        return Ok(SyncReport::Skipped {
            skipped: SkipReason::SyncDisabled,
        });
    }

    let Some(post) = deps
        .posts
        .get_post(post_id)
        .await
        .context("Failed to load post")?
    else {
        debug!("Post not found");
        let report = SyncReport::Skipped {
            skipped: SkipReason::PostNotFound,
        };
        audit(actor_id, post_id, event, &report, false, deps).await;
        return Ok(report);
    };

    let attempts = join_all(
        platforms
            .iter()
            .map(|platform| sync_platform(*platform, actor_id, event, &post, deps)),
    )
    .await;

    let mut results = BTreeMap::new();
    let mut failures = Vec::new();

    for (platform, attempt) in attempts {
        let outcome = match attempt {
            Ok(outcome) => outcome,
            Err(e) => {
                let classified = classify(&e);
                if classified.retryable {
                    warn!(platform = %platform, error = %e, "Retryable platform failure");
                    failures.push(PlatformFailure {
                        platform,
                        message: classified.message.clone(),
                        status: classified.status,
                    });
                } else {
                    warn!(platform = %platform, error = %e, "Permanent platform failure");
                }
                PlatformOutcome::failed(classified.message)
            }
        };
        results.insert(platform, outcome);
    }

    let report = SyncReport::Completed { results };
    audit(actor_id, post_id, event, &report, !failures.is_empty(), deps).await;

    if !failures.is_empty() {
        return Err(SyncError::Retryable(failures));
    }

    info!("Sync event completed");
    Ok(report)
}

async fn sync_platform(
    platform: Platform,
    actor_id: UserId,
    event: SyncEvent,
    post: &Post,
    deps: &SyncDeps,
) -> (Platform, anyhow::Result<PlatformOutcome>) {
    if event.publishes() && post.is_deleted {
        return (platform, Ok(PlatformOutcome::skipped(SkipReason::PostDeleted)));
    }

    let adapter = adapter_for(platform, actor_id, deps);
    let outcome = adapter
        .apply(event, post)
        .instrument(tracing::debug_span!("platform", platform = %platform))
        .await;
    (platform, outcome)
}

/// Federation is fire-and-forget; its outcome never touches platform sync.
async fn federate(actor_id: UserId, post_id: PostId, event: SyncEvent, deps: &SyncDeps) {
    let request = FederationRequest {
        actor_id,
        post_id,
        event,
    };
    if let Err(e) = deps.federation.sync_post(&request).await {
        warn!(error = %e, "Federation fan-out failed");
    }
}

async fn audit(
    actor_id: UserId,
    post_id: PostId,
    event: SyncEvent,
    report: &SyncReport,
    retryable: bool,
    deps: &SyncDeps,
) {
    let report = match serde_json::to_value(report) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Could not serialize sync report for audit");
            return;
        }
    };

    let entry = SyncAuditEntry {
        post_id,
        actor_id,
        event: event.as_str().to_string(),
        report: Json(report),
        retryable,
        recorded_at: Utc::now(),
    };
    if let Err(e) = deps.audit.record(&entry).await {
        warn!(error = %e, "Failed to record sync audit");
    }
}
