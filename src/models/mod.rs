// Domain records shared by the store, the services and the HTTP layer

pub mod content;
pub mod feed;
pub mod forum;
pub mod identity;
pub mod reviews;

pub use content::{Comment, CommentView, CreatePostRequest, NewPost, Post, PostType, PostView};
pub use feed::{
    fold_search_text, FeedFilters, FeedPage, FeedQuery, FollowOutcome, LikeOutcome,
    MembershipToggle, SubscriptionSet, SubscriptionSummary,
};
pub use forum::{
    CreateForumPostRequest, ForumCategory, ForumFilters, ForumPost, ForumPostView, ForumQuery,
    NewForumPost, Reply, ReplyView,
};
pub use identity::{
    NewOrganization, NewThoughtLeader, NewUser, Organization, OrganizationCategory,
    OrganizationListing, Role, ThoughtLeader, ThoughtLeaderListing, User,
};
pub use reviews::{
    AggregateSnapshot, Company, CompanyReview, CompanyReviewInput, DimensionAverages,
    DimensionRatings, EntityAggregate, EntityReview, EntityReviewInput, NewCompany,
    NewCompanyReview, NewEntityReview, NewReviewSubject, RatedReview, ReviewSubject,
    ReviewSubjectKind,
};
