use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Body for `POST /2/tweets`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CreateTweetRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<TweetReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_tweet_id: Option<String>,
}

impl CreateTweetRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_reply_to(mut self, tweet_id: impl Into<String>) -> Self {
        self.reply = Some(TweetReply {
            in_reply_to_tweet_id: tweet_id.into(),
        });
        self
    }

    pub fn quoting(mut self, tweet_id: impl Into<String>) -> Self {
        self.quote_tweet_id = Some(tweet_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TweetReply {
    pub in_reply_to_tweet_id: String,
}

/// A created tweet.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// The authenticated user (`GET /2/users/me`).
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body for the engagement endpoints (likes, retweets, bookmarks).
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TweetIdBody<'a> {
    pub tweet_id: &'a str,
}

/// Wrapper for v2 responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// Boolean acknowledgement returned by engagement and delete endpoints,
/// e.g. `{"data":{"liked":true}}` or `{"data":{"deleted":true}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Acknowledgement {
    #[serde(alias = "liked", alias = "retweeted", alias = "bookmarked", alias = "deleted")]
    pub value: Option<bool>,
}

/// Response of the OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl OAuthToken {
    /// Absolute expiry computed from `expires_in`, relative to `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + Duration::seconds(secs))
    }
}
