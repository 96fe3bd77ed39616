// Engagement Aggregator - owns every mutation of derived counts
// Likes, follows, helpful marks, views, comments, reviews and company aggregates go through here

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::EngagementConfig;
use crate::core::{
    Author, CommentId, CompanyId, FollowTarget, ForumPostId, LikeTarget, PostId, Reaction,
    ReviewSubjectId, Timestamp, UserId,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::EngagementStore;
use crate::models::{
    AggregateSnapshot, Comment, CommentView, CompanyReview, CompanyReviewInput,
    CreateForumPostRequest, CreatePostRequest, DimensionAverages, EntityAggregate, EntityReview,
    EntityReviewInput, FollowOutcome, ForumPost, ForumPostView, LikeOutcome, MembershipToggle,
    NewCompanyReview, NewEntityReview, NewForumPost, NewPost, Post, PostView, RatedReview, Reply,
    ReplyView, ReviewSubject,
};
use crate::services::validation;

#[derive(Clone)]
pub struct EngagementAggregator {
    store: Arc<dyn EngagementStore>,
    config: EngagementConfig,
}

impl EngagementAggregator {
    pub fn new(store: Arc<dyn EngagementStore>, config: EngagementConfig) -> Self {
        Self { store, config }
    }

    /// Flip `actor`'s membership in one edge set and report the new count.
    ///
    /// The edge write and any cached counter delta commit together, so two
    /// toggles in a row always return to the starting state.
    #[instrument(skip(self))]
    pub async fn toggle_membership(
        &self,
        relation: Reaction,
        subject: i64,
        actor: UserId,
    ) -> AppResult<MembershipToggle> {
        let toggle = self
            .store
            .toggle_reaction(relation, subject, actor, Timestamp::now())
            .await?;
        info!(
            subject,
            %actor,
            is_member = toggle.is_member,
            count = toggle.count,
            "membership toggled"
        );
        Ok(toggle)
    }

    pub async fn toggle_like(&self, target: LikeTarget, actor: UserId) -> AppResult<LikeOutcome> {
        let toggle = self
            .toggle_membership(target.relation(), target.subject_id(), actor)
            .await?;
        Ok(toggle.into())
    }

    pub async fn toggle_follow(
        &self,
        target: FollowTarget,
        actor: UserId,
    ) -> AppResult<FollowOutcome> {
        let toggle = match target {
            FollowTarget::ThoughtLeader(id) => {
                self.toggle_membership(Reaction::ThoughtLeaderFollow, id.value(), actor)
                    .await?
            }
            FollowTarget::Organization(id) => {
                self.toggle_membership(Reaction::OrganizationFollow, id.value(), actor)
                    .await?
            }
            FollowTarget::Topic(raw) => {
                let topic = validation::topic(&raw)?;
                let toggle = self
                    .store
                    .toggle_topic_subscription(actor, &topic, Timestamp::now())
                    .await?;
                info!(%topic, %actor, following = toggle.is_member, "topic subscription toggled");
                toggle
            }
        };
        Ok(toggle.into())
    }

    /// Rewrite a cached counter from its relation table
    #[instrument(skip(self))]
    pub async fn refresh_counter(&self, relation: Reaction, subject: i64) -> AppResult<i64> {
        let count = self.store.refresh_counter(relation, subject).await?;
        debug!(subject, count, "counter refreshed");
        Ok(count)
    }

    pub async fn record_view(&self, post: PostId) -> AppResult<i64> {
        self.store.increment_post_views(post).await
    }

    /// Count a view and return the post as the viewer sees it
    pub async fn post_detail(&self, post: PostId, viewer: UserId) -> AppResult<PostView> {
        self.record_view(post).await?;
        self.store
            .post_view(post, viewer)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post))
    }

    #[instrument(skip(self, request))]
    pub async fn create_post(&self, actor: UserId, request: CreatePostRequest) -> AppResult<Post> {
        let title = validation::post_title(&request.title)?;
        let body = validation::post_body(&request.body)?;
        let external_link = validation::external_link(request.external_link.as_deref())?;
        let topics = validation::topics(&request.topics)?;

        let author = self.resolve_author(actor, request.organization_id).await?;
        let post = self
            .store
            .create_post(
                NewPost {
                    author,
                    post_type: request.post_type,
                    title,
                    body,
                    external_link,
                    topics,
                },
                Timestamp::now(),
            )
            .await?;

        info!(post_id = %post.id, ?author, "post created");
        Ok(post)
    }

    /// Thought leaders write as themselves; organization admins write as an
    /// organization they manage. Everyone else may not post.
    async fn resolve_author(
        &self,
        actor: UserId,
        requested: Option<crate::core::OrganizationId>,
    ) -> AppResult<Author> {
        if self.store.get_user(actor).await?.is_none() {
            return Err(AppError::not_found("User", actor));
        }

        if self.store.thought_leader_for_user(actor).await?.is_some() {
            return Ok(Author::User(actor));
        }

        let managed = self.store.managed_organizations(actor).await?;
        match (requested, managed.first()) {
            (_, None) => Err(AppError::PermissionDenied(
                "You must be a thought leader or organization admin to post".to_string(),
            )),
            (Some(org), Some(_)) if managed.contains(&org) => Ok(Author::Organization(org)),
            (Some(org), Some(_)) => Err(AppError::PermissionDenied(format!(
                "You do not manage organization {}",
                org
            ))),
            (None, Some(first)) => Ok(Author::Organization(*first)),
        }
    }

    #[instrument(skip(self, body))]
    pub async fn create_comment(
        &self,
        post: PostId,
        actor: UserId,
        body: &str,
    ) -> AppResult<Comment> {
        let body = validation::comment_body(body, self.config.comment_max_chars)?;
        let comment = self
            .store
            .create_comment(post, actor, body, Timestamp::now())
            .await?;
        debug!(comment_id = %comment.id, "comment created");
        Ok(comment)
    }

    pub async fn comments(&self, post: PostId, viewer: UserId) -> AppResult<Vec<CommentView>> {
        self.store.list_comments(post, viewer).await
    }

    pub async fn comment(&self, id: CommentId) -> AppResult<Comment> {
        self.store
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", id))
    }

    /// Store a review and bring the company aggregate up to date
    #[instrument(skip(self, input))]
    pub async fn create_review(
        &self,
        company: CompanyId,
        actor: UserId,
        input: CompanyReviewInput,
    ) -> AppResult<CompanyReview> {
        let review = validation::review(input)?;
        let stored = self
            .store
            .create_company_review(
                NewCompanyReview {
                    company_id: company,
                    author_id: actor,
                    review,
                },
                Timestamp::now(),
            )
            .await?;
        self.recompute_company_aggregate(company).await?;
        info!(review_id = %stored.id, "company review created");
        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn recompute_company_aggregate(
        &self,
        company: CompanyId,
    ) -> AppResult<AggregateSnapshot> {
        let reviews = self.store.company_reviews(company).await?;
        let snapshot = recompute_aggregate(&reviews);
        self.store.store_company_aggregate(company, &snapshot).await?;
        info!(
            review_count = snapshot.review_count,
            overall_rating = snapshot.overall_rating,
            "company aggregate recomputed"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self, request))]
    pub async fn create_forum_post(
        &self,
        actor: UserId,
        request: CreateForumPostRequest,
    ) -> AppResult<ForumPost> {
        let title = validation::forum_title(&request.title)?;
        let content = validation::forum_content(&request.content)?;
        let tags = validation::tags(&request.tags)?;

        let post = self
            .store
            .create_forum_post(
                NewForumPost {
                    author_id: actor,
                    category: request.category,
                    title,
                    content,
                    tags,
                },
                Timestamp::now(),
            )
            .await?;
        info!(forum_post_id = %post.id, category = post.category.as_str(), "forum post created");
        Ok(post)
    }

    /// Count a view and return the thread as the viewer sees it
    pub async fn forum_post_detail(
        &self,
        post: ForumPostId,
        viewer: UserId,
    ) -> AppResult<ForumPostView> {
        self.store.increment_forum_post_views(post).await?;
        self.store
            .forum_post_view(post, viewer)
            .await?
            .ok_or_else(|| AppError::not_found("Forum post", post))
    }

    #[instrument(skip(self, content))]
    pub async fn create_reply(
        &self,
        post: ForumPostId,
        actor: UserId,
        content: &str,
    ) -> AppResult<Reply> {
        let content = validation::comment_body(content, self.config.comment_max_chars)?;
        let reply = self
            .store
            .create_reply(post, actor, content, Timestamp::now())
            .await?;
        debug!(reply_id = %reply.id, "reply created");
        Ok(reply)
    }

    pub async fn replies(&self, post: ForumPostId, viewer: UserId) -> AppResult<Vec<ReplyView>> {
        self.store.list_replies(post, viewer).await
    }

    pub async fn review_subject(&self, id: ReviewSubjectId) -> AppResult<ReviewSubject> {
        self.store
            .get_review_subject(id)
            .await?
            .ok_or_else(|| AppError::not_found("Review subject", id))
    }

    /// Store a program, supervisor or service review and refresh its subject's aggregate
    #[instrument(skip(self, input))]
    pub async fn create_entity_review(
        &self,
        subject: ReviewSubjectId,
        actor: UserId,
        input: EntityReviewInput,
    ) -> AppResult<EntityReview> {
        let kind = self.review_subject(subject).await?.kind;
        let review = validation::entity_review(kind, input)?;
        let stored = self
            .store
            .create_entity_review(
                NewEntityReview {
                    subject_id: subject,
                    author_id: actor,
                    review,
                },
                Timestamp::now(),
            )
            .await?;
        self.recompute_subject_aggregate(subject).await?;
        info!(review_id = %stored.id, kind = kind.as_str(), "entity review created");
        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn recompute_subject_aggregate(
        &self,
        subject: ReviewSubjectId,
    ) -> AppResult<EntityAggregate> {
        let reviews = self.store.entity_reviews(subject).await?;
        let aggregate = recompute_entity_aggregate(&reviews);
        self.store.store_entity_aggregate(subject, &aggregate).await?;
        info!(
            review_count = aggregate.review_count,
            average_rating = aggregate.average_rating,
            "subject aggregate recomputed"
        );
        Ok(aggregate)
    }
}

/// Two-decimal rounding with ties to even, so 2.125 becomes 2.12
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Integer percentage of `part` in `whole`, truncated toward zero
fn truncated_percentage(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        0
    } else {
        (part * 100 / whole) as i64
    }
}

/// Mean of a review's dimension ratings, rounded to two decimals
pub fn average_of_dimensions<R: RatedReview + ?Sized>(review: &R) -> f64 {
    let ratings = review.dimension_ratings();
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    round2(f64::from(sum) / ratings.len() as f64)
}

/// Summary statistics over a company's reviews. Zero reviews yield all zeros.
pub fn recompute_aggregate(reviews: &[CompanyReview]) -> AggregateSnapshot {
    if reviews.is_empty() {
        return AggregateSnapshot::default();
    }

    let n = reviews.len();
    let overall_sum: u32 = reviews.iter().map(|r| u32::from(r.overall_rating)).sum();

    let mut sums = [0u32; 5];
    for review in reviews {
        for (slot, rating) in sums.iter_mut().zip(review.dimensions.as_array()) {
            *slot += u32::from(rating);
        }
    }
    let dims = sums.map(|sum| round2(f64::from(sum) / n as f64));

    let recommending = reviews.iter().filter(|r| r.recommend_to_friend).count();
    let ceo_answers: Vec<bool> = reviews.iter().filter_map(|r| r.ceo_approval).collect();
    let approving = ceo_answers.iter().filter(|approved| **approved).count();

    AggregateSnapshot {
        review_count: n as i64,
        overall_rating: round2(f64::from(overall_sum) / n as f64),
        dimension_averages: DimensionAverages {
            work_life_balance: dims[0],
            culture_values: dims[1],
            career_opportunities: dims[2],
            compensation_benefits: dims[3],
            senior_management: dims[4],
        },
        recommend_to_friend_percentage: truncated_percentage(recommending, n),
        ceo_approval_percentage: truncated_percentage(approving, ceo_answers.len()),
    }
}

/// Review count, mean overall rating and recommendation share for one subject
pub fn recompute_entity_aggregate(reviews: &[EntityReview]) -> EntityAggregate {
    if reviews.is_empty() {
        return EntityAggregate::default();
    }

    let n = reviews.len();
    let overall_sum: u32 = reviews.iter().map(|r| u32::from(r.overall_rating)).sum();
    let answers: Vec<bool> = reviews.iter().filter_map(|r| r.would_recommend).collect();
    let recommending = answers.iter().filter(|yes| **yes).count();

    EntityAggregate {
        review_count: n as i64,
        average_rating: round2(f64::from(overall_sum) / n as f64),
        recommend_percentage: truncated_percentage(recommending, answers.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ReviewId;
    use crate::models::DimensionRatings;

    fn review(overall: u8, dims: [u8; 5], recommend: bool, ceo: Option<bool>) -> CompanyReview {
        CompanyReview {
            id: ReviewId::new(1),
            company_id: CompanyId::new(1),
            author_id: UserId::new(1),
            overall_rating: overall,
            dimensions: DimensionRatings::from_array(dims),
            title: "t".to_string(),
            pros: "p".to_string(),
            cons: "c".to_string(),
            advice_to_management: None,
            recommend_to_friend: recommend,
            ceo_approval: ceo,
            helpful_count: 0,
            created_at: Timestamp::new(0),
        }
    }

    #[test]
    fn test_average_of_dimensions() {
        let dims = DimensionRatings::from_array([3, 4, 5, 2, 4]);
        assert_eq!(average_of_dimensions(&dims), 3.60);
        let r = review(5, [1, 2, 2, 2, 2], true, None);
        assert_eq!(average_of_dimensions(&r), 1.8);
    }

    #[test]
    fn test_zero_reviews_aggregate_is_zero() {
        assert_eq!(recompute_aggregate(&[]), AggregateSnapshot::default());
        let snapshot = recompute_aggregate(&[]);
        assert_eq!(snapshot.overall_rating, 0.0);
        assert_eq!(snapshot.recommend_to_friend_percentage, 0);
    }

    #[test]
    fn test_recommend_percentage_truncates() {
        let reviews = vec![
            review(4, [4; 5], true, Some(true)),
            review(5, [5; 5], true, None),
            review(3, [3; 5], false, Some(false)),
        ];
        let snapshot = recompute_aggregate(&reviews);
        assert_eq!(snapshot.review_count, 3);
        assert_eq!(snapshot.overall_rating, 4.0);
        assert_eq!(snapshot.recommend_to_friend_percentage, 66);
        // Only the two reviews that answered count toward CEO approval
        assert_eq!(snapshot.ceo_approval_percentage, 50);
        assert_eq!(snapshot.dimension_averages.culture_values, 4.0);
    }

    #[test]
    fn test_overall_mean_rounds_to_two_decimals() {
        let reviews = vec![
            review(5, [1; 5], false, None),
            review(4, [2; 5], false, None),
            review(4, [2; 5], false, None),
        ];
        let snapshot = recompute_aggregate(&reviews);
        assert_eq!(snapshot.overall_rating, 4.33);
        assert_eq!(snapshot.dimension_averages.work_life_balance, 1.67);
        assert_eq!(snapshot.ceo_approval_percentage, 0);
    }

    #[test]
    fn test_half_cent_means_round_to_even() {
        // 17 / 8 = 2.125 sits exactly between 2.12 and 2.13
        let mut reviews = vec![review(3, [3; 5], false, None)];
        reviews.extend((0..7).map(|_| review(2, [2; 5], false, None)));
        let snapshot = recompute_aggregate(&reviews);
        assert_eq!(snapshot.overall_rating, 2.12);

        assert_eq!(round2(2.375), 2.38);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(4.333333), 4.33);
    }

    fn entity_review(overall: u8, recommend: Option<bool>) -> EntityReview {
        EntityReview {
            id: crate::core::EntityReviewId::new(1),
            subject_id: ReviewSubjectId::new(1),
            author_id: UserId::new(1),
            overall_rating: overall,
            dimension_ratings: Default::default(),
            content: "c".to_string(),
            would_recommend: recommend,
            helpful_count: 0,
            created_at: Timestamp::new(0),
        }
    }

    #[test]
    fn test_entity_aggregate() {
        assert_eq!(recompute_entity_aggregate(&[]), EntityAggregate::default());

        let reviews = vec![
            entity_review(5, Some(true)),
            entity_review(4, Some(false)),
            entity_review(4, Some(true)),
            entity_review(2, None),
        ];
        let aggregate = recompute_entity_aggregate(&reviews);
        assert_eq!(aggregate.review_count, 4);
        assert_eq!(aggregate.average_rating, 3.75);
        // Two of the three answers recommend
        assert_eq!(aggregate.recommend_percentage, 66);
    }
}
