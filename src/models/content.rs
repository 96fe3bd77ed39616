// Content records: posts and their comments

use serde::{Deserialize, Serialize};

use crate::core::{Author, CommentId, OrganizationId, PostId, Timestamp, UserId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Article,
    Announcement,
    Insight,
    #[default]
    Discussion,
    Job,
    Event,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Article => "article",
            PostType::Announcement => "announcement",
            PostType::Insight => "insight",
            PostType::Discussion => "discussion",
            PostType::Job => "job",
            PostType::Event => "event",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "article" => Ok(PostType::Article),
            "announcement" => Ok(PostType::Announcement),
            "insight" => Ok(PostType::Insight),
            "discussion" => Ok(PostType::Discussion),
            "job" => Ok(PostType::Job),
            "event" => Ok(PostType::Event),
            other => Err(AppError::validation(
                "post_type",
                format!("Unknown post type: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: Author,
    pub post_type: PostType,
    pub title: String,
    pub body: String,
    pub external_link: Option<String>,
    pub topics: Vec<String>,
    pub views: i64,
    pub created_at: Timestamp,
}

/// A validated post ready to be written
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author: Author,
    pub post_type: PostType,
    pub title: String,
    pub body: String,
    pub external_link: Option<String>,
    pub topics: Vec<String>,
}

/// Post creation request as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub post_type: PostType,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Organization to post as, for organization admins
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
}

/// A post with its engagement counts, as shown in feeds and detail pages
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author_name: String,
    pub author_is_verified: bool,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub like_count: i64,
    pub liked_by_viewer: bool,
}
