// HTTP surface - JSON routes over the engagement services
// Every /api/v1 route acts on behalf of the viewer named in `X-Viewer-Id`

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    core::{
        CommentId, CompanyId, EntityReviewId, FollowTarget, ForumPostId, LikeTarget, PostId,
        ReplyId, ReviewId, ReviewSubjectId,
    },
    error::AppResult,
    infrastructure::{ApiJson, ApiPath, ApiQuery, Viewer},
    models::{
        AggregateSnapshot, Comment, CommentView, CompanyReview, CompanyReviewInput,
        CreateForumPostRequest, CreatePostRequest, EntityAggregate, EntityReview,
        EntityReviewInput, FeedFilters, FeedPage, FollowOutcome, ForumCategory, ForumFilters,
        ForumPost, ForumPostView, LikeOutcome, OrganizationCategory, OrganizationListing, Post,
        PostType, PostView, Reply, ReplyView, ReviewSubject, SubscriptionSummary,
        ThoughtLeaderListing,
    },
};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ForumParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub content: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Feed

pub async fn get_feed_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(params): ApiQuery<FeedParams>,
) -> AppResult<Json<FeedPage<PostView>>> {
    let post_type = non_blank(params.post_type)
        .map(|t| PostType::parse(t.trim()))
        .transpose()?;
    let filters = FeedFilters {
        search: non_blank(params.search),
        post_type,
    };
    let page = state
        .feed
        .get_feed(*viewer, &filters, params.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

pub async fn subscription_summary_handler(
    State(state): State<AppState>,
    viewer: Viewer,
) -> AppResult<Json<SubscriptionSummary>> {
    Ok(Json(state.feed.subscription_summary(*viewer).await?))
}

pub async fn thought_leaders_handler(
    State(state): State<AppState>,
    viewer: Viewer,
) -> AppResult<Json<Vec<ThoughtLeaderListing>>> {
    Ok(Json(state.feed.thought_leaders(*viewer).await?))
}

pub async fn organizations_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(params): ApiQuery<OrganizationParams>,
) -> AppResult<Json<Vec<OrganizationListing>>> {
    let category = non_blank(params.category)
        .map(|c| OrganizationCategory::parse(c.trim()))
        .transpose()?;
    Ok(Json(state.feed.organizations(*viewer, category).await?))
}

// Posts and comments

pub async fn create_post_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let post = state.aggregator.create_post(*viewer, request).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<PostView>> {
    Ok(Json(state.aggregator.post_detail(PostId::new(id), *viewer).await?))
}

pub async fn like_post_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LikeOutcome>> {
    let outcome = state
        .aggregator
        .toggle_like(LikeTarget::Post(PostId::new(id)), *viewer)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(state.aggregator.comments(PostId::new(id), *viewer).await?))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .aggregator
        .create_comment(PostId::new(id), *viewer, &request.body)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn like_comment_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LikeOutcome>> {
    let outcome = state
        .aggregator
        .toggle_like(LikeTarget::Comment(CommentId::new(id)), *viewer)
        .await?;
    Ok(Json(outcome))
}

// Follows

pub async fn toggle_follow_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath((target_type, target_id)): ApiPath<(String, String)>,
) -> AppResult<Json<FollowOutcome>> {
    let target = FollowTarget::parse(&target_type, &target_id)?;
    Ok(Json(state.aggregator.toggle_follow(target, *viewer).await?))
}

// Reviews

pub async fn create_review_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CompanyReviewInput>,
) -> AppResult<(StatusCode, Json<CompanyReview>)> {
    let review = state
        .aggregator
        .create_review(CompanyId::new(id), *viewer, input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn recompute_aggregate_handler(
    State(state): State<AppState>,
    _viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<AggregateSnapshot>> {
    Ok(Json(
        state
            .aggregator
            .recompute_company_aggregate(CompanyId::new(id))
            .await?,
    ))
}

pub async fn review_helpful_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LikeOutcome>> {
    let outcome = state
        .aggregator
        .toggle_like(LikeTarget::Review(ReviewId::new(id)), *viewer)
        .await?;
    Ok(Json(outcome))
}

// Forum

pub async fn forum_page_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(params): ApiQuery<ForumParams>,
) -> AppResult<Json<FeedPage<ForumPostView>>> {
    let category = non_blank(params.category)
        .map(|c| ForumCategory::parse(c.trim()))
        .transpose()?;
    let filters = ForumFilters {
        search: non_blank(params.search),
        category,
    };
    let page = state
        .feed
        .forum_page(*viewer, &filters, params.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

pub async fn create_forum_post_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiJson(request): ApiJson<CreateForumPostRequest>,
) -> AppResult<(StatusCode, Json<ForumPost>)> {
    let post = state.aggregator.create_forum_post(*viewer, request).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_forum_post_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<ForumPostView>> {
    Ok(Json(
        state
            .aggregator
            .forum_post_detail(ForumPostId::new(id), *viewer)
            .await?,
    ))
}

pub async fn like_forum_post_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LikeOutcome>> {
    let outcome = state
        .aggregator
        .toggle_like(LikeTarget::ForumPost(ForumPostId::new(id)), *viewer)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_replies_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Vec<ReplyView>>> {
    Ok(Json(
        state
            .aggregator
            .replies(ForumPostId::new(id), *viewer)
            .await?,
    ))
}

pub async fn create_reply_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<CreateReplyRequest>,
) -> AppResult<(StatusCode, Json<Reply>)> {
    let reply = state
        .aggregator
        .create_reply(ForumPostId::new(id), *viewer, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn like_reply_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LikeOutcome>> {
    let outcome = state
        .aggregator
        .toggle_like(LikeTarget::Reply(ReplyId::new(id)), *viewer)
        .await?;
    Ok(Json(outcome))
}

// Program, supervisor and service reviews

pub async fn get_review_subject_handler(
    State(state): State<AppState>,
    _viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<ReviewSubject>> {
    Ok(Json(
        state
            .aggregator
            .review_subject(ReviewSubjectId::new(id))
            .await?,
    ))
}

pub async fn create_entity_review_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<EntityReviewInput>,
) -> AppResult<(StatusCode, Json<EntityReview>)> {
    let review = state
        .aggregator
        .create_entity_review(ReviewSubjectId::new(id), *viewer, input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn recompute_subject_aggregate_handler(
    State(state): State<AppState>,
    _viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<EntityAggregate>> {
    Ok(Json(
        state
            .aggregator
            .recompute_subject_aggregate(ReviewSubjectId::new(id))
            .await?,
    ))
}

pub async fn entity_review_helpful_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LikeOutcome>> {
    let outcome = state
        .aggregator
        .toggle_like(LikeTarget::EntityReview(EntityReviewId::new(id)), *viewer)
        .await?;
    Ok(Json(outcome))
}

pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.database.health_check().await?;
    Ok(Json(json!({"status": "ok"})))
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Feed and discovery
        .route("/feed", get(get_feed_handler))
        .route("/feed/subscriptions", get(subscription_summary_handler))
        .route("/thought-leaders", get(thought_leaders_handler))
        .route("/organizations", get(organizations_handler))
        // Posts and comments
        .route("/posts", post(create_post_handler))
        .route("/posts/{id}", get(get_post_handler))
        .route("/posts/{id}/like", post(like_post_handler))
        .route(
            "/posts/{id}/comments",
            get(list_comments_handler).post(create_comment_handler),
        )
        .route("/comments/{id}/like", post(like_comment_handler))
        // Follows
        .route("/follows/{target_type}/{target_id}", post(toggle_follow_handler))
        // Company reviews
        .route("/companies/{id}/reviews", post(create_review_handler))
        .route("/companies/{id}/aggregate", post(recompute_aggregate_handler))
        .route("/reviews/{id}/helpful", post(review_helpful_handler))
        // Forum
        .route(
            "/forum/posts",
            get(forum_page_handler).post(create_forum_post_handler),
        )
        .route("/forum/posts/{id}", get(get_forum_post_handler))
        .route("/forum/posts/{id}/like", post(like_forum_post_handler))
        .route(
            "/forum/posts/{id}/replies",
            get(list_replies_handler).post(create_reply_handler),
        )
        .route("/forum/replies/{id}/like", post(like_reply_handler))
        // Program, supervisor and service reviews
        .route("/review-subjects/{id}", get(get_review_subject_handler))
        .route("/review-subjects/{id}/reviews", post(create_entity_review_handler))
        .route(
            "/review-subjects/{id}/aggregate",
            post(recompute_subject_aggregate_handler),
        )
        .route("/entity-reviews/{id}/helpful", post(entity_review_helpful_handler))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", api_router())
        .with_state(state)
}
