//! Error types for the Bluesky client.

use serde::Deserialize;
use thiserror::Error;

/// Result type for Bluesky client operations.
pub type Result<T> = std::result::Result<T, BlueskyError>;

/// Bluesky client errors.
#[derive(Debug, Error)]
pub enum BlueskyError {
    /// Transport failure (connect, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx XRPC response. `error` is the lexicon error name when present.
    #[error("Bluesky API error ({status}): {message}")]
    Api {
        status: u16,
        error: Option<String>,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Not a well-formed `at://` URI
    #[error("Invalid AT URI: {0}")]
    InvalidUri(String),
}

impl BlueskyError {
    /// HTTP status of an API error, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            BlueskyError::Api { status, .. } => Some(*status),
            BlueskyError::Http(e) => e.status().map(|s| s.as_u16()),
            BlueskyError::Parse(_) | BlueskyError::InvalidUri(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XrpcErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Turn an XRPC error response into a [`BlueskyError::Api`].
///
/// The message joins the distinct `error` and `message` fields; when the body
/// has neither, the raw body or the reason phrase is used.
pub(crate) fn api_error(status: u16, body: &str) -> BlueskyError {
    let parsed: XrpcErrorBody = serde_json::from_str(body).unwrap_or_default();

    let mut parts: Vec<String> = Vec::new();
    for part in [parsed.error.as_deref(), parsed.message.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        if !parts.iter().any(|p| p.eq_ignore_ascii_case(part)) {
            parts.push(part.to_string());
        }
    }

    let message = if !parts.is_empty() {
        parts.join(": ")
    } else if !body.trim().is_empty() && !body.trim_start().starts_with('{') {
        body.trim().chars().take(300).collect()
    } else {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status))
    };

    BlueskyError::Api {
        status,
        error: parsed.error,
        message,
    }
}
