//! Retryable-vs-permanent decision for a failed remote call.

use bluesky_client::BlueskyError;
use lazy_static::lazy_static;
use regex::Regex;
use twitter_client::TwitterError;

lazy_static! {
    // Transient network signatures, as they show up in error text
    static ref TRANSIENT_NETWORK: Regex = Regex::new(
        r"(?i)timed out|timeout|etimedout|econnreset|connection reset|eai_again|socket hang up"
    ).unwrap();
}

/// A failure as the orchestrator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub retryable: bool,
    pub status: Option<u16>,
    /// The most specific human-readable message available.
    pub message: String,
}

/// 429 and every 5xx are worth another attempt.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

fn transport_is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Classify an error by walking its chain for a typed client error, then
/// falling back to matching the rendered text.
pub fn classify(err: &anyhow::Error) -> Classified {
    let full_text = format!("{:#}", err);

    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<TwitterError>() {
            return match e {
                TwitterError::Api { status, message } => Classified {
                    retryable: is_retryable_status(*status),
                    status: Some(*status),
                    message: message.clone(),
                },
                TwitterError::Http(inner) => from_reqwest(inner, &full_text),
                TwitterError::Parse(_) => by_message(None, &full_text),
            };
        }

        if let Some(e) = cause.downcast_ref::<BlueskyError>() {
            return match e {
                BlueskyError::Api {
                    status, message, ..
                } => Classified {
                    retryable: is_retryable_status(*status),
                    status: Some(*status),
                    message: message.clone(),
                },
                BlueskyError::Http(inner) => from_reqwest(inner, &full_text),
                BlueskyError::Parse(_) | BlueskyError::InvalidUri(_) => {
                    by_message(None, &full_text)
                }
            };
        }

        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            return from_reqwest(e, &full_text);
        }
    }

    by_message(None, &full_text)
}

fn from_reqwest(err: &reqwest::Error, full_text: &str) -> Classified {
    let status = err.status().map(|s| s.as_u16());
    if transport_is_transient(err) || status.map(is_retryable_status).unwrap_or(false) {
        return Classified {
            retryable: true,
            status,
            message: full_text.to_string(),
        };
    }
    by_message(status, full_text)
}

fn by_message(status: Option<u16>, full_text: &str) -> Classified {
    Classified {
        retryable: TRANSIENT_NETWORK.is_match(full_text),
        status,
        message: full_text.to_string(),
    }
}
