//! Error types for the Twitter client.

use serde::Deserialize;
use thiserror::Error;

/// Result type for Twitter client operations.
pub type Result<T> = std::result::Result<T, TwitterError>;

/// Twitter client errors.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Transport failure (connect, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `message` is built from the error envelope.
    #[error("Twitter API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TwitterError {
    /// HTTP status of an API error, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            TwitterError::Api { status, .. } => Some(*status),
            TwitterError::Http(e) => e.status().map(|s| s.as_u16()),
            TwitterError::Parse(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    title: Option<String>,
    detail: Option<String>,
    error_description: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    message: Option<String>,
    detail: Option<String>,
    title: Option<String>,
}

/// Build a readable message from an error response body.
///
/// v2 problem responses carry `title`/`detail`, older endpoints an `errors`
/// array and the OAuth endpoint `error_description`. Every distinct piece is
/// kept, in order, joined with `: `. Falls back to the raw body, then to the
/// reason phrase for `status`.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();

    let mut parts: Vec<String> = Vec::new();
    let candidates = [envelope.title, envelope.detail, envelope.error_description]
        .into_iter()
        .chain(
            envelope
                .errors
                .into_iter()
                .flat_map(|e| [e.title, e.message, e.detail]),
        )
        .flatten();

    for candidate in candidates {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        if !parts.iter().any(|p| p.eq_ignore_ascii_case(candidate)) {
            parts.push(candidate.to_string());
        }
    }

    if !parts.is_empty() {
        return parts.join(": ");
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.chars().take(300).collect();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_envelope_joins_title_and_detail() {
        let body = r#"{"title":"Forbidden","detail":"You are not permitted to perform this action.","type":"about:blank","status":403}"#;
        assert_eq!(
            error_message_from_body(403, body),
            "Forbidden: You are not permitted to perform this action."
        );
    }

    #[test]
    fn test_duplicate_parts_are_dropped() {
        let body = r#"{"title":"Too Many Requests","detail":"Too Many Requests","errors":[{"message":"too many requests"}]}"#;
        assert_eq!(error_message_from_body(429, body), "Too Many Requests");
    }

    #[test]
    fn test_errors_array() {
        let body = r#"{"errors":[{"message":"Tweet text is too long."},{"message":"Duplicate content"}]}"#;
        assert_eq!(
            error_message_from_body(400, body),
            "Tweet text is too long.: Duplicate content"
        );
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        assert_eq!(error_message_from_body(503, ""), "Service Unavailable");
        assert_eq!(error_message_from_body(503, "{}"), "Service Unavailable");
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(error_message_from_body(502, "upstream timed out"), "upstream timed out");
    }
}
