use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const POST_COLLECTION: &str = "app.bsky.feed.post";
pub const LIKE_COLLECTION: &str = "app.bsky.feed.like";
pub const REPOST_COLLECTION: &str = "app.bsky.feed.repost";

/// Session returned by `createSession` / `refreshSession`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub handle: String,
    pub did: String,
}

/// `com.atproto.repo.strongRef`: a record pinned to a specific version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateSessionRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub record: &'a serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeleteRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub rkey: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadBlobResponse {
    pub blob: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResolveHandleResponse {
    pub did: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeleteBookmarkRequest<'a> {
    pub uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying it.
///
/// Only used to decide whether a session needs refreshing; the server
/// remains the authority on validity.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256K","typ":"at+jwt"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_jwt_expiry_reads_exp_claim() {
        let token = jwt_with_payload(r#"{"scope":"com.atproto.access","sub":"did:plc:x","exp":1700000000}"#);
        assert_eq!(jwt_expiry(&token).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_jwt_expiry_missing_or_garbage() {
        assert!(jwt_expiry(&jwt_with_payload(r#"{"sub":"did:plc:x"}"#)).is_none());
        assert!(jwt_expiry("not-a-jwt").is_none());
        assert!(jwt_expiry("a.%%%.c").is_none());
    }
}
