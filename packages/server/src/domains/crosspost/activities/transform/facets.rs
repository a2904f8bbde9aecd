//! Rich-text facets: links and mentions, addressed by UTF-8 byte offsets.

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::common::utils::ELLIPSIS;
use crate::kernel::BaseBlueskyApi;

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r"https?://[^\s<>]+").unwrap();

    // Handle must have at least one dot; the leading group anchors on a word boundary
    static ref MENTION_REGEX: Regex = Regex::new(
        r"(?:^|[\s(])(@([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+))"
    ).unwrap();
}

const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', ELLIPSIS,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Link(String),
    /// Handle without the `@`.
    Mention(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSpan {
    pub byte_start: usize,
    pub byte_end: usize,
    pub kind: SpanKind,
}

/// Find link and mention spans in `text`, ordered by position.
pub fn detect_spans(text: &str) -> Vec<FacetSpan> {
    let mut spans = Vec::new();

    for m in URL_REGEX.find_iter(text) {
        let uri = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if !has_host(uri) {
            continue;
        }
        spans.push(FacetSpan {
            byte_start: m.start(),
            byte_end: m.start() + uri.len(),
            kind: SpanKind::Link(uri.to_string()),
        });
    }

    for caps in MENTION_REGEX.captures_iter(text) {
        let (Some(whole), Some(handle)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let inside_link = spans
            .iter()
            .any(|s| whole.start() >= s.byte_start && whole.start() < s.byte_end);
        if inside_link {
            continue;
        }
        spans.push(FacetSpan {
            byte_start: whole.start(),
            byte_end: whole.end(),
            kind: SpanKind::Mention(handle.as_str().to_string()),
        });
    }

    spans.sort_by_key(|s| s.byte_start);
    spans
}

fn has_host(uri: &str) -> bool {
    uri.split_once("://")
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .is_some_and(|host| !host.is_empty())
}

/// Truncate to at most `max_chars` characters with a trailing `…`, never
/// cutting through a link or mention. A span that would be split is dropped
/// whole, along with everything after it.
pub fn truncate_outside_spans(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut cut = text
        .char_indices()
        .nth(max_chars - 1)
        .map_or(text.len(), |(i, _)| i);
    if let Some(span) = detect_spans(text)
        .into_iter()
        .find(|s| s.byte_start < cut && cut < s.byte_end)
    {
        cut = span.byte_start;
    }

    let mut out = text[..cut].trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Build facet objects for `text`. Mentions whose handle does not resolve
/// are left as plain text.
pub async fn build_facets(text: &str, api: &dyn BaseBlueskyApi) -> Result<Vec<Value>> {
    let mut facets = Vec::new();

    for span in detect_spans(text) {
        let feature = match &span.kind {
            SpanKind::Link(uri) => json!({
                "$type": "app.bsky.richtext.facet#link",
                "uri": uri,
            }),
            SpanKind::Mention(handle) => match api.resolve_handle(handle).await {
                Ok(did) => json!({
                    "$type": "app.bsky.richtext.facet#mention",
                    "did": did,
                }),
                Err(e) => {
                    tracing::debug!(handle = %handle, error = %e, "Mention did not resolve, leaving as text");
                    continue;
                }
            },
        };

        facets.push(json!({
            "index": {"byteStart": span.byte_start, "byteEnd": span.byte_end},
            "features": [feature],
        }));
    }

    Ok(facets)
}
