// Post authorship: a post is written by a user or by an organization, never both

use serde::{Deserialize, Serialize};

use crate::core::strong_types::{OrganizationId, UserId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Author {
    User(UserId),
    Organization(OrganizationId),
}

impl Author {
    /// Resolve the two nullable author columns of a stored post.
    ///
    /// Legacy rows may carry both columns; the user column wins. A row with
    /// neither is corrupt and reported as an internal error.
    pub fn from_columns(user_id: Option<i64>, organization_id: Option<i64>) -> AppResult<Self> {
        match (user_id, organization_id) {
            (Some(user), _) => Ok(Author::User(UserId::new(user))),
            (None, Some(org)) => Ok(Author::Organization(OrganizationId::new(org))),
            (None, None) => Err(AppError::Internal(
                "post row has neither an author user nor an author organization".to_string(),
            )),
        }
    }

    /// Split back into (author_user_id, author_organization_id) columns
    pub fn to_columns(self) -> (Option<i64>, Option<i64>) {
        match self {
            Author::User(id) => (Some(id.value()), None),
            Author::Organization(id) => (None, Some(id.value())),
        }
    }
}
