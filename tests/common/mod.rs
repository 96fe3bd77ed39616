#![allow(dead_code)]

use std::sync::Arc;

use engg_engagement::{
    app_state::AppState,
    config::Config,
    core::{
        Author, CompanyId, ForumPostId, OrganizationId, PostId, ReviewSubjectId,
        ThoughtLeaderId, Timestamp, UserId,
    },
    infrastructure::{EngagementStore, SqliteDatabase},
    models::{
        CompanyReviewInput, DimensionRatings, ForumCategory, NewCompany, NewForumPost,
        NewOrganization, NewPost, NewReviewSubject, NewThoughtLeader, NewUser,
        OrganizationCategory, PostType, ReviewSubjectKind, Role,
    },
};

pub struct Fixture {
    pub state: AppState,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_page_size(10).await
    }

    pub async fn with_page_size(page_size: u32) -> Self {
        let mut config = Config::in_memory();
        config.engagement.feed_page_size = page_size;
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        Self {
            state: AppState::with_database(db, config),
        }
    }

    /// A fixture over a WAL database file with a multi-connection pool
    pub async fn file_backed(path: &std::path::Path, max_connections: u32) -> Self {
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let mut config = Config::in_memory();
        config.database.url = url.clone();
        config.database.max_connections = max_connections;
        let db = Arc::new(SqliteDatabase::connect(&url, max_connections).await.unwrap());
        Self {
            state: AppState::with_database(db, config),
        }
    }

    pub fn store(&self) -> &dyn EngagementStore {
        self.state.database.as_ref()
    }

    pub async fn user(&self, username: &str) -> UserId {
        self.store()
            .create_user(
                NewUser {
                    username: username.to_string(),
                    display_name: format!("{} (display)", username),
                    role: Role::Professional,
                },
                Timestamp::new(1),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn thought_leader(&self, username: &str) -> (UserId, ThoughtLeaderId) {
        let user = self.user(username).await;
        let profile = self
            .store()
            .promote_to_thought_leader(
                user,
                NewThoughtLeader {
                    title: "Engineer".to_string(),
                    verified: true,
                    ..Default::default()
                },
                Timestamp::new(1),
            )
            .await
            .unwrap();
        (user, profile.id)
    }

    pub async fn organization(&self, name: &str) -> OrganizationId {
        self.store()
            .create_organization(
                NewOrganization {
                    name: name.to_string(),
                    category: OrganizationCategory::Association,
                    description: String::new(),
                    verified: true,
                },
                Timestamp::new(1),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn post_at(
        &self,
        author: Author,
        title: &str,
        topics: &[&str],
        created_at: i64,
    ) -> PostId {
        self.typed_post_at(author, PostType::Article, title, "body text", topics, created_at)
            .await
    }

    pub async fn typed_post_at(
        &self,
        author: Author,
        post_type: PostType,
        title: &str,
        body: &str,
        topics: &[&str],
        created_at: i64,
    ) -> PostId {
        self.store()
            .create_post(
                NewPost {
                    author,
                    post_type,
                    title: title.to_string(),
                    body: body.to_string(),
                    external_link: None,
                    topics: topics.iter().map(|t| t.to_string()).collect(),
                },
                Timestamp::new(created_at),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn company(&self, name: &str) -> CompanyId {
        self.store()
            .create_company(
                NewCompany {
                    name: name.to_string(),
                    industry: "Engineering".to_string(),
                    verified: true,
                },
                Timestamp::new(1),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn forum_post_at(
        &self,
        author: UserId,
        category: ForumCategory,
        title: &str,
        created_at: i64,
    ) -> ForumPostId {
        self.store()
            .create_forum_post(
                NewForumPost {
                    author_id: author,
                    category,
                    title: title.to_string(),
                    content: "thread body".to_string(),
                    tags: vec![],
                },
                Timestamp::new(created_at),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn review_subject(&self, kind: ReviewSubjectKind, name: &str) -> ReviewSubjectId {
        self.store()
            .create_review_subject(
                NewReviewSubject {
                    kind,
                    name: name.to_string(),
                },
                Timestamp::new(1),
            )
            .await
            .unwrap()
            .id
    }
}

pub fn review_input(
    overall: u8,
    dims: [u8; 5],
    recommend: bool,
    ceo_approval: Option<bool>,
) -> CompanyReviewInput {
    CompanyReviewInput {
        overall_rating: overall,
        dimensions: DimensionRatings::from_array(dims),
        title: "Worked here two years".to_string(),
        pros: "Good mentors".to_string(),
        cons: "Slow promotions".to_string(),
        advice_to_management: None,
        recommend_to_friend: recommend,
        ceo_approval,
    }
}
