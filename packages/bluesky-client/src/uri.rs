//! `at://` URI parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::BlueskyError;

/// A record URI: `at://<repo>/<collection>/<rkey>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtUri {
    pub repo: String,
    pub collection: String,
    pub rkey: String,
}

impl FromStr for AtUri {
    type Err = BlueskyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| BlueskyError::InvalidUri(s.to_string()))?;

        let mut parts = rest.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(repo), Some(collection), Some(rkey))
                if !repo.is_empty() && !collection.is_empty() && !rkey.is_empty() =>
            {
                Ok(Self {
                    repo: repo.to_string(),
                    collection: collection.to_string(),
                    rkey: rkey.to_string(),
                })
            }
            _ => Err(BlueskyError::InvalidUri(s.to_string())),
        }
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.repo, self.collection, self.rkey)
    }
}
