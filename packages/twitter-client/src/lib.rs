//! Pure Twitter v2 REST API client.
//!
//! A minimal client covering what cross-posting needs: creating and deleting
//! tweets, retweets, likes and bookmarks on behalf of a user, and refreshing
//! OAuth2 user tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! use twitter_client::{CreateTweetRequest, TwitterClient};
//!
//! let client = TwitterClient::new()?;
//! let tweet = client
//!     .create_tweet(&access_token, &CreateTweetRequest::new("hello").in_reply_to("100"))
//!     .await?;
//! println!("posted {}", tweet.id);
//! ```

pub mod error;
pub mod types;

pub use error::{error_message_from_body, Result, TwitterError};
pub use types::{CreateTweetRequest, OAuthToken, Tweet, TweetReply, User};

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use types::{Acknowledgement, ApiResponse, TweetIdBody};

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
}

impl TwitterClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Point the client at another host (tests, proxies) with its own timeout.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Post a tweet, reply or quote.
    pub async fn create_tweet(&self, token: &str, request: &CreateTweetRequest) -> Result<Tweet> {
        let req = self
            .client
            .post(self.url("/2/tweets"))
            .bearer_auth(token)
            .json(request);
        let resp: ApiResponse<Tweet> = send(req).await?;
        tracing::debug!(tweet_id = %resp.data.id, "Tweet created");
        Ok(resp.data)
    }

    pub async fn delete_tweet(&self, token: &str, tweet_id: &str) -> Result<bool> {
        let req = self
            .client
            .delete(self.url(&format!("/2/tweets/{}", tweet_id)))
            .bearer_auth(token);
        acknowledge(req).await
    }

    /// The user the token belongs to.
    pub async fn me(&self, token: &str) -> Result<User> {
        let req = self.client.get(self.url("/2/users/me")).bearer_auth(token);
        let resp: ApiResponse<User> = send(req).await?;
        Ok(resp.data)
    }

    pub async fn retweet(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<bool> {
        self.engage(token, user_id, "retweets", tweet_id).await
    }

    pub async fn unretweet(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<bool> {
        self.disengage(token, user_id, "retweets", tweet_id).await
    }

    pub async fn like(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<bool> {
        self.engage(token, user_id, "likes", tweet_id).await
    }

    pub async fn unlike(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<bool> {
        self.disengage(token, user_id, "likes", tweet_id).await
    }

    pub async fn bookmark(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<bool> {
        self.engage(token, user_id, "bookmarks", tweet_id).await
    }

    pub async fn remove_bookmark(&self, token: &str, user_id: &str, tweet_id: &str) -> Result<bool> {
        self.disengage(token, user_id, "bookmarks", tweet_id).await
    }

    /// Exchange a refresh token for a new access token (confidential client).
    pub async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<OAuthToken> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ];
        let req = self
            .client
            .post(self.url("/2/oauth2/token"))
            .basic_auth(client_id, Some(client_secret))
            .form(&form);
        let token: OAuthToken = send(req).await?;
        tracing::debug!(expires_in = ?token.expires_in, "Refreshed OAuth2 token");
        Ok(token)
    }

    async fn engage(&self, token: &str, user_id: &str, kind: &str, tweet_id: &str) -> Result<bool> {
        let req = self
            .client
            .post(self.url(&format!("/2/users/{}/{}", user_id, kind)))
            .bearer_auth(token)
            .json(&TweetIdBody { tweet_id });
        acknowledge(req).await
    }

    async fn disengage(&self, token: &str, user_id: &str, kind: &str, tweet_id: &str) -> Result<bool> {
        let req = self
            .client
            .delete(self.url(&format!("/2/users/{}/{}/{}", user_id, kind, tweet_id)))
            .bearer_auth(token);
        acknowledge(req).await
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let body = read_success_body(resp).await?;
    serde_json::from_str(&body).map_err(|e| TwitterError::Parse(format!("{}: {}", e, body)))
}

async fn acknowledge(req: RequestBuilder) -> Result<bool> {
    let resp = req.send().await?;
    let body = read_success_body(resp).await?;
    let ack: ApiResponse<Acknowledgement> = serde_json::from_str(&body)
        .map_err(|e| TwitterError::Parse(format!("{}: {}", e, body)))?;
    Ok(ack.data.value.unwrap_or(true))
}

async fn read_success_body(resp: Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(TwitterError::Api {
            status: status.as_u16(),
            message: error_message_from_body(status.as_u16(), &body),
        });
    }
    Ok(body)
}
