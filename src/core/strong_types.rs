// Strong Types - newtype identifiers so a PostId can never be passed where a UserId is expected

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares an i64-backed identifier newtype with the usual conversions
macro_rules! strong_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(self) -> i64 {
                self.0
            }

            /// Row ids handed out by the store are always positive
            pub fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

strong_id!(
    /// Platform user
    UserId
);
strong_id!(
    /// Public author profile attached to a user
    ThoughtLeaderId
);
strong_id!(
    /// Professional body that can author posts and be followed
    OrganizationId
);
strong_id!(CompanyId);
strong_id!(PostId);
strong_id!(CommentId);
strong_id!(ReviewId);
strong_id!(ForumPostId);
strong_id!(ReplyId);
strong_id!(
    /// Program, supervisor or professional service open to reviews
    ReviewSubjectId
);
strong_id!(EntityReviewId);

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self(current_time_millis())
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn to_datetime(self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}

pub fn current_time_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
