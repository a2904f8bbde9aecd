//! Pure AT Protocol XRPC client for Bluesky.
//!
//! Covers what cross-posting needs: password sessions and their refresh,
//! record create/delete in the user's repo, blob upload, handle resolution
//! and bookmarks.
//!
//! # Example
//!
//! ```rust,ignore
//! use bluesky_client::{BlueskyClient, POST_COLLECTION};
//!
//! let client = BlueskyClient::new(bluesky_client::DEFAULT_SERVICE_URL)?;
//! let session = client.create_session("alice.bsky.social", "app-password").await?;
//! let record = serde_json::json!({
//!     "$type": POST_COLLECTION,
//!     "text": "hello",
//!     "createdAt": chrono::Utc::now().to_rfc3339(),
//! });
//! let created = client
//!     .create_record(&session.access_jwt, &session.did, POST_COLLECTION, &record)
//!     .await?;
//! println!("{} {}", created.uri, created.cid);
//! ```

pub mod error;
pub mod types;
pub mod uri;

pub use error::{BlueskyError, Result};
pub use types::{
    jwt_expiry, Session, StrongRef, LIKE_COLLECTION, POST_COLLECTION, REPOST_COLLECTION,
};
pub use uri::AtUri;

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use types::{
    CreateRecordRequest, CreateSessionRequest, DeleteBookmarkRequest, DeleteRecordRequest,
    ResolveHandleResponse, UploadBlobResponse,
};

pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BlueskyClient {
    client: reqwest::Client,
    service_url: String,
}

impl BlueskyClient {
    pub fn new(service_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(service_url, DEFAULT_TIMEOUT)
    }

    /// Fails only if the TLS backend cannot be initialized.
    pub fn with_timeout(service_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            service_url: service_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service_url, method)
    }

    /// Log in with an identifier (handle or email) and an app password.
    pub async fn create_session(&self, identifier: &str, password: &str) -> Result<Session> {
        let req = self
            .client
            .post(self.xrpc("com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier,
                password,
            });
        let session: Session = send(req).await?;
        tracing::debug!(did = %session.did, handle = %session.handle, "Created session");
        Ok(session)
    }

    /// Trade a refresh JWT for a new session.
    pub async fn refresh_session(&self, refresh_jwt: &str) -> Result<Session> {
        let req = self
            .client
            .post(self.xrpc("com.atproto.server.refreshSession"))
            .bearer_auth(refresh_jwt);
        send(req).await
    }

    pub async fn create_record(
        &self,
        access_jwt: &str,
        repo: &str,
        collection: &str,
        record: &serde_json::Value,
    ) -> Result<StrongRef> {
        let req = self
            .client
            .post(self.xrpc("com.atproto.repo.createRecord"))
            .bearer_auth(access_jwt)
            .json(&CreateRecordRequest {
                repo,
                collection,
                record,
            });
        let created: StrongRef = send(req).await?;
        tracing::debug!(uri = %created.uri, "Created record");
        Ok(created)
    }

    pub async fn delete_record(
        &self,
        access_jwt: &str,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<()> {
        let req = self
            .client
            .post(self.xrpc("com.atproto.repo.deleteRecord"))
            .bearer_auth(access_jwt)
            .json(&DeleteRecordRequest {
                repo,
                collection,
                rkey,
            });
        send_empty(req).await
    }

    /// Upload binary data; returns the blob object to embed in a record as-is.
    pub async fn upload_blob(
        &self,
        access_jwt: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<serde_json::Value> {
        let req = self
            .client
            .post(self.xrpc("com.atproto.repo.uploadBlob"))
            .bearer_auth(access_jwt)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes);
        let resp: UploadBlobResponse = send(req).await?;
        Ok(resp.blob)
    }

    /// Resolve a handle (without the leading `@`) to a DID.
    pub async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let req = self
            .client
            .get(self.xrpc("com.atproto.identity.resolveHandle"))
            .query(&[("handle", handle)]);
        let resp: ResolveHandleResponse = send(req).await?;
        Ok(resp.did)
    }

    pub async fn create_bookmark(&self, access_jwt: &str, subject: &StrongRef) -> Result<()> {
        let req = self
            .client
            .post(self.xrpc("app.bsky.bookmark.createBookmark"))
            .bearer_auth(access_jwt)
            .json(subject);
        send_empty(req).await
    }

    pub async fn delete_bookmark(&self, access_jwt: &str, uri: &str) -> Result<()> {
        let req = self
            .client
            .post(self.xrpc("app.bsky.bookmark.deleteBookmark"))
            .bearer_auth(access_jwt)
            .json(&DeleteBookmarkRequest { uri });
        send_empty(req).await
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let body = read_success_body(resp).await?;
    serde_json::from_str(&body).map_err(|e| BlueskyError::Parse(format!("{}: {}", e, body)))
}

async fn send_empty(req: RequestBuilder) -> Result<()> {
    let resp = req.send().await?;
    read_success_body(resp).await.map(|_| ())
}

async fn read_success_body(resp: Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(error::api_error(status.as_u16(), &body));
    }
    Ok(body)
}
