//! Typed integer ids for home-platform entities.
//!
//! Home ids are plain `BIGINT`s; wrapping them keeps a `UserId` from being
//! passed where a `PostId` was expected. Each id is transparent for both
//! serde and sqlx, so it reads and writes as the bare number.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[inline]
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            #[inline]
            pub fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

define_id!(
    /// Id of a home post (posts, replies, quotes and retweets alike).
    PostId
);
define_id!(
    /// Id of a home user.
    UserId
);
define_id!(
    /// Id of a home project.
    ProjectId
);
define_id!(
    /// Id of a home list.
    ListId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&PostId(42)).unwrap(), "42");
        let back: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(back, UserId(7));
    }

    #[test]
    fn test_parse_from_str() {
        assert_eq!(" 41 ".parse::<PostId>().unwrap(), PostId(41));
        assert!("abc".parse::<PostId>().is_err());
    }
}
