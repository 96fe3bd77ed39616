// Community forum: categorized threads with tags, likes, views and replies

use serde::{Deserialize, Serialize};

use crate::core::{ForumPostId, ReplyId, Timestamp, UserId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumCategory {
    #[default]
    General,
    Career,
    Technical,
    Industry,
    Academia,
    Startups,
    Jobs,
    Scholarships,
}

impl ForumCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForumCategory::General => "general",
            ForumCategory::Career => "career",
            ForumCategory::Technical => "technical",
            ForumCategory::Industry => "industry",
            ForumCategory::Academia => "academia",
            ForumCategory::Startups => "startups",
            ForumCategory::Jobs => "jobs",
            ForumCategory::Scholarships => "scholarships",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "general" => Ok(ForumCategory::General),
            "career" => Ok(ForumCategory::Career),
            "technical" => Ok(ForumCategory::Technical),
            "industry" => Ok(ForumCategory::Industry),
            "academia" => Ok(ForumCategory::Academia),
            "startups" => Ok(ForumCategory::Startups),
            "jobs" => Ok(ForumCategory::Jobs),
            "scholarships" => Ok(ForumCategory::Scholarships),
            other => Err(AppError::validation(
                "category",
                format!("Unknown forum category: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: ForumPostId,
    pub author_id: UserId,
    pub category: ForumCategory,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub views: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewForumPost {
    pub author_id: UserId,
    pub category: ForumCategory,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateForumPostRequest {
    #[serde(default)]
    pub category: ForumCategory,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A thread with its like and reply counts
#[derive(Debug, Clone, Serialize)]
pub struct ForumPostView {
    #[serde(flatten)]
    pub post: ForumPost,
    pub author_name: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub post_id: ForumPostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    #[serde(flatten)]
    pub reply: Reply,
    pub author_name: String,
    pub like_count: i64,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumFilters {
    pub search: Option<String>,
    pub category: Option<ForumCategory>,
}

/// Store-level forum listing query, newest threads first
#[derive(Debug, Clone)]
pub struct ForumQuery {
    pub viewer: UserId,
    /// Case-folded search needle
    pub search: Option<String>,
    pub category: Option<ForumCategory>,
    pub limit: u32,
    pub offset: u64,
}
