/// Pure utility functions for post text
///
/// These functions contain NO side effects - they take inputs and return outputs
/// without touching databases, making API calls, or performing I/O.

/// Ellipsis appended to truncated text (one character).
pub const ELLIPSIS: char = '…';

/// Truncate text to at most `max_chars` characters.
///
/// If the text is longer than `max_chars`, it is cut at a character boundary
/// to `max_chars - 1` characters (trailing whitespace removed) and `…` is
/// appended, for at most `max_chars` characters in total.
///
/// If it fits, it is returned unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let kept: String = text.chars().take(max_chars - 1).collect();
    let mut out = kept.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Post body as plain text: `content` with surrounding whitespace removed.
pub fn plain_text(content: Option<&str>) -> String {
    content.map(str::trim).unwrap_or_default().to_string()
}
