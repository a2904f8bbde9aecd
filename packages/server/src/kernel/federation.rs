use anyhow::Result;
use async_trait::async_trait;

use super::{BaseFederation, FederationRequest};

/// Federation stand-in for deployments without an ActivityPub service.
pub struct LoggingFederation;

#[async_trait]
impl BaseFederation for LoggingFederation {
    async fn sync_post(&self, request: &FederationRequest) -> Result<()> {
        tracing::debug!(
            actor_id = %request.actor_id,
            post_id = %request.post_id,
            event = %request.event,
            "Federation not configured, nothing to fan out"
        );
        Ok(())
    }
}
