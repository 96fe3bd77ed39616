// Core types and primitives shared by the store and the services

pub mod author;
pub mod reactions;
pub mod strong_types;

pub use author::Author;
pub use reactions::{FollowTarget, LikeTarget, Reaction};
pub use strong_types::{
    current_time_millis, CommentId, CompanyId, EntityReviewId, ForumPostId, OrganizationId, PostId,
    ReplyId, ReviewId, ReviewSubjectId, ThoughtLeaderId, Timestamp, UserId,
};
