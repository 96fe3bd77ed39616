// Database Interface - persistence seam for the engagement service
// Relation tables are the source of truth; counter columns are projections owned by the store's toggle paths

use async_trait::async_trait;

use crate::core::{
    CommentId, CompanyId, ForumPostId, OrganizationId, PostId, Reaction, ReviewSubjectId,
    ThoughtLeaderId, Timestamp, UserId,
};
use crate::error::AppResult;
use crate::models::{
    AggregateSnapshot, Comment, CommentView, Company, CompanyReview, EntityAggregate, EntityReview,
    FeedQuery, ForumPost, ForumPostView, ForumQuery, MembershipToggle, NewCompany,
    NewCompanyReview, NewEntityReview, NewForumPost, NewOrganization, NewPost, NewReviewSubject,
    NewThoughtLeader, NewUser, Organization, OrganizationCategory, OrganizationListing, Post,
    PostView, Reply, ReplyView, ReviewSubject, SubscriptionSet, SubscriptionSummary,
    ThoughtLeader, ThoughtLeaderListing, User,
};

/// Storage operations used by the aggregator and the feed resolver.
///
/// Every mutating method is a single bounded transaction. Counter updates are
/// expressed as deltas evaluated by the database, never read-modify-write.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    // Identity & relationship store
    async fn create_user(&self, user: NewUser, now: Timestamp) -> AppResult<User>;
    async fn get_user(&self, id: UserId) -> AppResult<Option<User>>;
    async fn promote_to_thought_leader(
        &self,
        user: UserId,
        profile: NewThoughtLeader,
        now: Timestamp,
    ) -> AppResult<ThoughtLeader>;
    async fn get_thought_leader(&self, id: ThoughtLeaderId) -> AppResult<Option<ThoughtLeader>>;
    async fn thought_leader_for_user(&self, user: UserId) -> AppResult<Option<ThoughtLeader>>;
    async fn create_organization(
        &self,
        organization: NewOrganization,
        now: Timestamp,
    ) -> AppResult<Organization>;
    async fn get_organization(&self, id: OrganizationId) -> AppResult<Option<Organization>>;
    async fn add_organization_admin(&self, organization: OrganizationId, user: UserId)
        -> AppResult<()>;
    /// Organizations the user administers, lowest id first
    async fn managed_organizations(&self, user: UserId) -> AppResult<Vec<OrganizationId>>;
    async fn list_thought_leaders(&self, viewer: UserId) -> AppResult<Vec<ThoughtLeaderListing>>;
    async fn list_organizations(
        &self,
        viewer: UserId,
        category: Option<OrganizationCategory>,
    ) -> AppResult<Vec<OrganizationListing>>;

    // Relationship edges
    /// Flip `actor`'s membership in the `relation` edge set of `subject`
    async fn toggle_reaction(
        &self,
        relation: Reaction,
        subject: i64,
        actor: UserId,
        now: Timestamp,
    ) -> AppResult<MembershipToggle>;
    async fn toggle_topic_subscription(
        &self,
        actor: UserId,
        topic: &str,
        now: Timestamp,
    ) -> AppResult<MembershipToggle>;
    /// Edge count straight from the relation table
    async fn reaction_count(&self, relation: Reaction, subject: i64) -> AppResult<i64>;
    /// Stored counter column, `None` when the relation keeps no counter
    async fn cached_counter(&self, relation: Reaction, subject: i64) -> AppResult<Option<i64>>;
    /// Rewrite the counter column from the relation table and return the count
    async fn refresh_counter(&self, relation: Reaction, subject: i64) -> AppResult<i64>;
    async fn subscriptions(&self, viewer: UserId) -> AppResult<SubscriptionSet>;
    async fn subscription_summary(&self, viewer: UserId) -> AppResult<SubscriptionSummary>;

    // Content store
    async fn create_post(&self, post: NewPost, now: Timestamp) -> AppResult<Post>;
    async fn post_view(&self, id: PostId, viewer: UserId) -> AppResult<Option<PostView>>;
    /// Atomically bump the view counter, returning the new value
    async fn increment_post_views(&self, id: PostId) -> AppResult<i64>;
    async fn create_comment(
        &self,
        post: PostId,
        author: UserId,
        body: String,
        now: Timestamp,
    ) -> AppResult<Comment>;
    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>>;
    async fn list_comments(&self, post: PostId, viewer: UserId) -> AppResult<Vec<CommentView>>;
    /// One window of the feed, counts and author data fetched in the same query
    async fn feed_page(&self, query: &FeedQuery) -> AppResult<Vec<PostView>>;

    // Forum
    async fn create_forum_post(&self, post: NewForumPost, now: Timestamp) -> AppResult<ForumPost>;
    async fn forum_post_view(
        &self,
        id: ForumPostId,
        viewer: UserId,
    ) -> AppResult<Option<ForumPostView>>;
    async fn increment_forum_post_views(&self, id: ForumPostId) -> AppResult<i64>;
    /// One window of the forum listing with like and reply counts in the same query
    async fn forum_page(&self, query: &ForumQuery) -> AppResult<Vec<ForumPostView>>;
    async fn create_reply(
        &self,
        post: ForumPostId,
        author: UserId,
        content: String,
        now: Timestamp,
    ) -> AppResult<Reply>;
    async fn list_replies(&self, post: ForumPostId, viewer: UserId) -> AppResult<Vec<ReplyView>>;

    // Reviews and company aggregates
    async fn create_company(&self, company: NewCompany, now: Timestamp) -> AppResult<Company>;
    async fn get_company(&self, id: CompanyId) -> AppResult<Option<Company>>;
    async fn create_company_review(
        &self,
        review: NewCompanyReview,
        now: Timestamp,
    ) -> AppResult<CompanyReview>;
    async fn company_reviews(&self, company: CompanyId) -> AppResult<Vec<CompanyReview>>;
    async fn store_company_aggregate(
        &self,
        company: CompanyId,
        snapshot: &AggregateSnapshot,
    ) -> AppResult<()>;

    // Program, supervisor and service reviews
    async fn create_review_subject(
        &self,
        subject: NewReviewSubject,
        now: Timestamp,
    ) -> AppResult<ReviewSubject>;
    async fn get_review_subject(&self, id: ReviewSubjectId) -> AppResult<Option<ReviewSubject>>;
    async fn create_entity_review(
        &self,
        review: NewEntityReview,
        now: Timestamp,
    ) -> AppResult<EntityReview>;
    async fn entity_reviews(&self, subject: ReviewSubjectId) -> AppResult<Vec<EntityReview>>;
    async fn store_entity_aggregate(
        &self,
        subject: ReviewSubjectId,
        aggregate: &EntityAggregate,
    ) -> AppResult<()>;
}
