// Reaction relations - the many-to-many "actor reacted to subject" edge sets
// Every like, follow and helpful-mark is a row in the same edge table keyed by relation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::strong_types::{
    CommentId, EntityReviewId, ForumPostId, OrganizationId, PostId, ReplyId, ReviewId,
    ThoughtLeaderId,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    PostLike,
    CommentLike,
    ReviewHelpful,
    ForumPostLike,
    ReplyLike,
    EntityReviewHelpful,
    ThoughtLeaderFollow,
    OrganizationFollow,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::PostLike => "post_like",
            Reaction::CommentLike => "comment_like",
            Reaction::ReviewHelpful => "review_helpful",
            Reaction::ForumPostLike => "forum_post_like",
            Reaction::ReplyLike => "reply_like",
            Reaction::EntityReviewHelpful => "entity_review_helpful",
            Reaction::ThoughtLeaderFollow => "thought_leader_follow",
            Reaction::OrganizationFollow => "organization_follow",
        }
    }

    /// Table holding the reacted-to subject rows
    pub fn subject_table(&self) -> &'static str {
        match self {
            Reaction::PostLike => "posts",
            Reaction::CommentLike => "comments",
            Reaction::ReviewHelpful => "company_reviews",
            Reaction::ForumPostLike => "forum_posts",
            Reaction::ReplyLike => "replies",
            Reaction::EntityReviewHelpful => "entity_reviews",
            Reaction::ThoughtLeaderFollow => "thought_leaders",
            Reaction::OrganizationFollow => "organizations",
        }
    }

    /// Denormalized counter column on the subject table, if the relation keeps one
    pub fn cached_counter(&self) -> Option<&'static str> {
        match self {
            Reaction::PostLike
            | Reaction::CommentLike
            | Reaction::ForumPostLike
            | Reaction::ReplyLike => None,
            Reaction::ReviewHelpful | Reaction::EntityReviewHelpful => Some("helpful_count"),
            Reaction::ThoughtLeaderFollow | Reaction::OrganizationFollow => Some("follower_count"),
        }
    }

    pub fn subject_name(&self) -> &'static str {
        match self {
            Reaction::PostLike => "Post",
            Reaction::CommentLike => "Comment",
            Reaction::ReviewHelpful => "Review",
            Reaction::ForumPostLike => "Forum post",
            Reaction::ReplyLike => "Reply",
            Reaction::EntityReviewHelpful => "Review",
            Reaction::ThoughtLeaderFollow => "Thought leader",
            Reaction::OrganizationFollow => "Organization",
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content a like (or helpful mark) is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post(PostId),
    Comment(CommentId),
    Review(ReviewId),
    ForumPost(ForumPostId),
    Reply(ReplyId),
    EntityReview(EntityReviewId),
}

impl LikeTarget {
    pub fn relation(&self) -> Reaction {
        match self {
            LikeTarget::Post(_) => Reaction::PostLike,
            LikeTarget::Comment(_) => Reaction::CommentLike,
            LikeTarget::Review(_) => Reaction::ReviewHelpful,
            LikeTarget::ForumPost(_) => Reaction::ForumPostLike,
            LikeTarget::Reply(_) => Reaction::ReplyLike,
            LikeTarget::EntityReview(_) => Reaction::EntityReviewHelpful,
        }
    }

    pub fn subject_id(&self) -> i64 {
        match self {
            LikeTarget::Post(id) => id.value(),
            LikeTarget::Comment(id) => id.value(),
            LikeTarget::Review(id) => id.value(),
            LikeTarget::ForumPost(id) => id.value(),
            LikeTarget::Reply(id) => id.value(),
            LikeTarget::EntityReview(id) => id.value(),
        }
    }
}

/// What a follow toggle points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_type", content = "target_id", rename_all = "snake_case")]
pub enum FollowTarget {
    ThoughtLeader(ThoughtLeaderId),
    Organization(OrganizationId),
    Topic(String),
}

impl FollowTarget {
    /// Build a target from the `{target_type}/{target_id}` path pair
    pub fn parse(target_type: &str, target_id: &str) -> AppResult<Self> {
        let numeric = || {
            target_id
                .parse::<i64>()
                .map_err(|_| AppError::validation("target_id", "Target id must be an integer"))
        };
        match target_type {
            "thought_leader" | "thought-leader" => Ok(FollowTarget::ThoughtLeader(numeric()?.into())),
            "organization" => Ok(FollowTarget::Organization(numeric()?.into())),
            "topic" => Ok(FollowTarget::Topic(target_id.to_string())),
            other => Err(AppError::validation(
                "target_type",
                format!("Unknown follow target type: {}", other),
            )),
        }
    }
}
