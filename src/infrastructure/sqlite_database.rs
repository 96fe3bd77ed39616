use async_trait::async_trait;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{QueryBuilder, Row};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::{
    Author, CommentId, CompanyId, EntityReviewId, ForumPostId, OrganizationId, PostId, Reaction,
    ReplyId, ReviewId, ReviewSubjectId, ThoughtLeaderId, Timestamp, UserId,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::EngagementStore;
use crate::models::{
    fold_search_text, AggregateSnapshot, Comment, CommentView, Company, CompanyReview,
    DimensionRatings, EntityAggregate, EntityReview, FeedQuery, ForumCategory, ForumPost,
    ForumPostView, ForumQuery, MembershipToggle, NewCompany, NewCompanyReview, NewEntityReview,
    NewForumPost, NewOrganization, NewPost, NewReviewSubject, NewThoughtLeader, NewUser,
    Organization, OrganizationCategory, OrganizationListing, Post, PostType, PostView, Reply,
    ReplyView, ReviewSubject, ReviewSubjectKind, Role, SubscriptionSet, SubscriptionSummary,
    ThoughtLeader, ThoughtLeaderListing, User,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS thought_leaders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        organization TEXT NOT NULL DEFAULT '',
        bio TEXT NOT NULL DEFAULT '',
        expertise_areas TEXT NOT NULL DEFAULT '[]',
        verified INTEGER NOT NULL DEFAULT 0,
        follower_count INTEGER NOT NULL DEFAULT 0 CHECK (follower_count >= 0),
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        category TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        verified INTEGER NOT NULL DEFAULT 0,
        follower_count INTEGER NOT NULL DEFAULT 0 CHECK (follower_count >= 0),
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_admins (
        organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (organization_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
        author_organization_id INTEGER REFERENCES organizations(id) ON DELETE CASCADE,
        post_type TEXT NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        external_link TEXT,
        topics TEXT NOT NULL DEFAULT '[]',
        title_folded TEXT NOT NULL DEFAULT '',
        body_folded TEXT NOT NULL DEFAULT '',
        views INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        CHECK (author_user_id IS NOT NULL OR author_organization_id IS NOT NULL)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        body TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS forum_posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        category TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        title_folded TEXT NOT NULL DEFAULT '',
        content_folded TEXT NOT NULL DEFAULT '',
        views INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS replies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES forum_posts(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        industry TEXT NOT NULL DEFAULT '',
        verified INTEGER NOT NULL DEFAULT 0,
        overall_rating REAL NOT NULL DEFAULT 0,
        recommend_to_friend_percentage INTEGER NOT NULL DEFAULT 0,
        ceo_approval_percentage INTEGER NOT NULL DEFAULT 0,
        total_reviews_count INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS company_reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        overall_rating INTEGER NOT NULL CHECK (overall_rating BETWEEN 1 AND 5),
        work_life_balance_rating INTEGER NOT NULL CHECK (work_life_balance_rating BETWEEN 1 AND 5),
        culture_values_rating INTEGER NOT NULL CHECK (culture_values_rating BETWEEN 1 AND 5),
        career_opportunities_rating INTEGER NOT NULL CHECK (career_opportunities_rating BETWEEN 1 AND 5),
        compensation_benefits_rating INTEGER NOT NULL CHECK (compensation_benefits_rating BETWEEN 1 AND 5),
        senior_management_rating INTEGER NOT NULL CHECK (senior_management_rating BETWEEN 1 AND 5),
        title TEXT NOT NULL,
        pros TEXT NOT NULL,
        cons TEXT NOT NULL,
        advice_to_management TEXT,
        recommend_to_friend INTEGER NOT NULL DEFAULT 1,
        ceo_approval INTEGER,
        helpful_count INTEGER NOT NULL DEFAULT 0 CHECK (helpful_count >= 0),
        created_at INTEGER NOT NULL,
        UNIQUE (company_id, author_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS review_subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        name TEXT NOT NULL,
        review_count INTEGER NOT NULL DEFAULT 0,
        average_rating REAL NOT NULL DEFAULT 0,
        recommend_percentage INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        UNIQUE (kind, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entity_reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_id INTEGER NOT NULL REFERENCES review_subjects(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        overall_rating INTEGER NOT NULL CHECK (overall_rating BETWEEN 1 AND 5),
        dimension_ratings TEXT NOT NULL DEFAULT '{}',
        content TEXT NOT NULL,
        would_recommend INTEGER,
        helpful_count INTEGER NOT NULL DEFAULT 0 CHECK (helpful_count >= 0),
        created_at INTEGER NOT NULL,
        UNIQUE (subject_id, author_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reactions (
        relation TEXT NOT NULL,
        subject_id INTEGER NOT NULL,
        actor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        time_created INTEGER NOT NULL,
        PRIMARY KEY (relation, subject_id, actor_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topic_subscriptions (
        subscriber_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        topic TEXT NOT NULL,
        time_created INTEGER NOT NULL,
        PRIMARY KEY (subscriber_id, topic)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC, id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_type ON posts(post_type)",
    "CREATE INDEX IF NOT EXISTS idx_posts_author_user ON posts(author_user_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_author_org ON posts(author_organization_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_forum_posts_created ON forum_posts(created_at DESC, id)",
    "CREATE INDEX IF NOT EXISTS idx_forum_posts_category ON forum_posts(category)",
    "CREATE INDEX IF NOT EXISTS idx_replies_post ON replies(post_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_company ON company_reviews(company_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_entity_reviews_subject ON entity_reviews(subject_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_reactions_actor ON reactions(relation, actor_id)",
    "CREATE INDEX IF NOT EXISTS idx_topic_subscriptions_topic ON topic_subscriptions(topic)",
];

const USER_COLUMNS: &str = "u.id, u.username, u.display_name, u.role, u.created_at";

const THOUGHT_LEADER_COLUMNS: &str = "tl.id, tl.user_id, tl.title, tl.organization, tl.bio, \
     tl.expertise_areas, tl.verified, tl.follower_count, tl.created_at";

const ORGANIZATION_COLUMNS: &str =
    "o.id, o.name, o.category, o.description, o.verified, o.follower_count, o.created_at";

const COMPANY_COLUMNS: &str = "c.id, c.name, c.industry, c.verified, c.overall_rating, \
     c.recommend_to_friend_percentage, c.ceo_approval_percentage, c.total_reviews_count, c.created_at";

const REVIEW_COLUMNS: &str = "r.id, r.company_id, r.author_id, r.overall_rating, \
     r.work_life_balance_rating, r.culture_values_rating, r.career_opportunities_rating, \
     r.compensation_benefits_rating, r.senior_management_rating, r.title, r.pros, r.cons, \
     r.advice_to_management, r.recommend_to_friend, r.ceo_approval, r.helpful_count, r.created_at";

const REVIEW_SUBJECT_COLUMNS: &str = "s.id, s.kind, s.name, s.review_count, s.average_rating, \
     s.recommend_percentage, s.created_at";

const ENTITY_REVIEW_COLUMNS: &str = "er.id, er.subject_id, er.author_id, er.overall_rating, \
     er.dimension_ratings, er.content, er.would_recommend, er.helpful_count, er.created_at";

// Post rows joined with author display data and engagement counts.
// The viewer id is bound between HEAD and TAIL.
const POST_VIEW_HEAD: &str = r#"
    SELECT p.id, p.author_user_id, p.author_organization_id, p.post_type, p.title, p.body,
           p.external_link, p.topics, p.views, p.created_at,
           COALESCE(u.display_name, o.name, 'Unknown') AS author_name,
           CASE WHEN p.author_user_id IS NOT NULL THEN COALESCE(tl.verified, 0)
                ELSE COALESCE(o.verified, 0) END AS author_is_verified,
           (SELECT COUNT(*) FROM reactions lr
             WHERE lr.relation = 'post_like' AND lr.subject_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count,
           EXISTS (SELECT 1 FROM reactions vr
                    WHERE vr.relation = 'post_like' AND vr.subject_id = p.id AND vr.actor_id = "#;

const POST_VIEW_TAIL: &str = r#") AS liked_by_viewer
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_user_id
    LEFT JOIN thought_leaders tl ON tl.user_id = p.author_user_id
    LEFT JOIN organizations o ON o.id = p.author_organization_id
    WHERE 1 = 1"#;

// Forum threads with like and reply counts; viewer bound between HEAD and TAIL
const FORUM_VIEW_HEAD: &str = r#"
    SELECT f.id, f.author_id, f.category, f.title, f.content, f.tags, f.views, f.created_at,
           COALESCE(u.display_name, 'Unknown') AS author_name,
           (SELECT COUNT(*) FROM reactions lr
             WHERE lr.relation = 'forum_post_like' AND lr.subject_id = f.id) AS like_count,
           (SELECT COUNT(*) FROM replies rp WHERE rp.post_id = f.id) AS reply_count,
           EXISTS (SELECT 1 FROM reactions vr
                    WHERE vr.relation = 'forum_post_like' AND vr.subject_id = f.id AND vr.actor_id = "#;

const FORUM_VIEW_TAIL: &str = r#") AS liked_by_viewer
    FROM forum_posts f
    LEFT JOIN users u ON u.id = f.author_id
    WHERE 1 = 1"#;

/// SQLite implementation of the engagement store
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to a database URL such as `sqlite:data/app.db?mode=rwc` and create the schema
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database URL {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
            // get_filename consumes the options it is called on
            let filename = options.clone().get_filename();
            if let Some(parent) = filename.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::ConfigurationError(format!(
                            "Cannot create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
        }

        // An in-memory database lives and dies with its connection
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e))
        })?;

        let db = Self { pool };
        db.initialize().await?;
        info!(url, in_memory, "engagement store ready");
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Create tables and indexes; safe to run against an existing database
    pub async fn initialize(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    async fn require_user(&self, id: UserId) -> AppResult<()> {
        let exists = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if exists {
            Ok(())
        } else {
            Err(AppError::not_found("User", id))
        }
    }

    async fn require_row(&self, table: &'static str, what: &str, id: i64) -> AppResult<()> {
        let exists = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?", table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if exists {
            Ok(())
        } else {
            Err(AppError::not_found(what, id))
        }
    }
}

fn post_view_query<'a>(viewer: UserId) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::<Sqlite>::new(POST_VIEW_HEAD);
    qb.push_bind(viewer.value());
    qb.push(POST_VIEW_TAIL);
    qb
}

fn forum_view_query<'a>(viewer: UserId) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::<Sqlite>::new(FORUM_VIEW_HEAD);
    qb.push_bind(viewer.value());
    qb.push(FORUM_VIEW_TAIL);
    qb
}

/// `AND (instr(a, needle) > 0 OR instr(b, needle) > 0)` over folded columns
fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, columns: [&str; 2], needle: &str) {
    qb.push(format!(" AND (instr({}, ", columns[0]));
    qb.push_bind(needle.to_string());
    qb.push(format!(") > 0 OR instr({}, ", columns[1]));
    qb.push_bind(needle.to_string());
    qb.push(") > 0)");
}

fn decode_list(raw: &str, column: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Internal(format!("Corrupt JSON list in {}: {}", column, e)))
}

fn encode_list(values: &[String]) -> AppResult<String> {
    serde_json::to_string(values)
        .map_err(|e| AppError::Internal(format!("Failed to encode list: {}", e)))
}

fn rating(row: &SqliteRow, column: &str) -> AppResult<u8> {
    let value: i64 = row.try_get(column)?;
    u8::try_from(value)
        .map_err(|_| AppError::Internal(format!("Rating {} out of range in {}", value, column)))
}

fn user_from_row(row: &SqliteRow) -> AppResult<User> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        role: Role::parse(&row.try_get::<String, _>("role")?)?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn thought_leader_from_row(row: &SqliteRow) -> AppResult<ThoughtLeader> {
    Ok(ThoughtLeader {
        id: ThoughtLeaderId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        title: row.try_get("title")?,
        organization: row.try_get("organization")?,
        bio: row.try_get("bio")?,
        expertise_areas: decode_list(&row.try_get::<String, _>("expertise_areas")?, "expertise_areas")?,
        verified: row.try_get("verified")?,
        follower_count: row.try_get("follower_count")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn organization_from_row(row: &SqliteRow) -> AppResult<Organization> {
    Ok(Organization {
        id: OrganizationId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        category: OrganizationCategory::parse(&row.try_get::<String, _>("category")?)?,
        description: row.try_get("description")?,
        verified: row.try_get("verified")?,
        follower_count: row.try_get("follower_count")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn post_from_row(row: &SqliteRow) -> AppResult<Post> {
    Ok(Post {
        id: PostId::new(row.try_get("id")?),
        author: Author::from_columns(
            row.try_get("author_user_id")?,
            row.try_get("author_organization_id")?,
        )?,
        post_type: PostType::parse(&row.try_get::<String, _>("post_type")?)?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        external_link: row.try_get("external_link")?,
        topics: decode_list(&row.try_get::<String, _>("topics")?, "topics")?,
        views: row.try_get("views")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn post_view_from_row(row: &SqliteRow) -> AppResult<PostView> {
    Ok(PostView {
        post: post_from_row(row)?,
        author_name: row.try_get("author_name")?,
        author_is_verified: row.try_get::<i64, _>("author_is_verified")? != 0,
        like_count: row.try_get("like_count")?,
        comment_count: row.try_get("comment_count")?,
        liked_by_viewer: row.try_get::<i64, _>("liked_by_viewer")? != 0,
    })
}

fn comment_from_row(row: &SqliteRow) -> AppResult<Comment> {
    Ok(Comment {
        id: CommentId::new(row.try_get("id")?),
        post_id: PostId::new(row.try_get("post_id")?),
        author_id: UserId::new(row.try_get("author_id")?),
        body: row.try_get("body")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn company_from_row(row: &SqliteRow) -> AppResult<Company> {
    Ok(Company {
        id: CompanyId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        industry: row.try_get("industry")?,
        verified: row.try_get("verified")?,
        overall_rating: row.try_get("overall_rating")?,
        recommend_to_friend_percentage: row.try_get("recommend_to_friend_percentage")?,
        ceo_approval_percentage: row.try_get("ceo_approval_percentage")?,
        total_reviews_count: row.try_get("total_reviews_count")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn review_from_row(row: &SqliteRow) -> AppResult<CompanyReview> {
    Ok(CompanyReview {
        id: ReviewId::new(row.try_get("id")?),
        company_id: CompanyId::new(row.try_get("company_id")?),
        author_id: UserId::new(row.try_get("author_id")?),
        overall_rating: rating(row, "overall_rating")?,
        dimensions: DimensionRatings {
            work_life_balance: rating(row, "work_life_balance_rating")?,
            culture_values: rating(row, "culture_values_rating")?,
            career_opportunities: rating(row, "career_opportunities_rating")?,
            compensation_benefits: rating(row, "compensation_benefits_rating")?,
            senior_management: rating(row, "senior_management_rating")?,
        },
        title: row.try_get("title")?,
        pros: row.try_get("pros")?,
        cons: row.try_get("cons")?,
        advice_to_management: row.try_get("advice_to_management")?,
        recommend_to_friend: row.try_get("recommend_to_friend")?,
        ceo_approval: row.try_get("ceo_approval")?,
        helpful_count: row.try_get("helpful_count")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn forum_post_from_row(row: &SqliteRow) -> AppResult<ForumPost> {
    Ok(ForumPost {
        id: ForumPostId::new(row.try_get("id")?),
        author_id: UserId::new(row.try_get("author_id")?),
        category: ForumCategory::parse(&row.try_get::<String, _>("category")?)?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        tags: decode_list(&row.try_get::<String, _>("tags")?, "tags")?,
        views: row.try_get("views")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn forum_post_view_from_row(row: &SqliteRow) -> AppResult<ForumPostView> {
    Ok(ForumPostView {
        post: forum_post_from_row(row)?,
        author_name: row.try_get("author_name")?,
        like_count: row.try_get("like_count")?,
        reply_count: row.try_get("reply_count")?,
        liked_by_viewer: row.try_get::<i64, _>("liked_by_viewer")? != 0,
    })
}

fn reply_from_row(row: &SqliteRow) -> AppResult<Reply> {
    Ok(Reply {
        id: ReplyId::new(row.try_get("id")?),
        post_id: ForumPostId::new(row.try_get("post_id")?),
        author_id: UserId::new(row.try_get("author_id")?),
        content: row.try_get("content")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn review_subject_from_row(row: &SqliteRow) -> AppResult<ReviewSubject> {
    Ok(ReviewSubject {
        id: ReviewSubjectId::new(row.try_get("id")?),
        kind: ReviewSubjectKind::parse(&row.try_get::<String, _>("kind")?)?,
        name: row.try_get("name")?,
        review_count: row.try_get("review_count")?,
        average_rating: row.try_get("average_rating")?,
        recommend_percentage: row.try_get("recommend_percentage")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

fn entity_review_from_row(row: &SqliteRow) -> AppResult<EntityReview> {
    let raw: String = row.try_get("dimension_ratings")?;
    let dimension_ratings: BTreeMap<String, u8> = serde_json::from_str(&raw)
        .map_err(|e| AppError::Internal(format!("Corrupt dimension_ratings: {}", e)))?;
    Ok(EntityReview {
        id: EntityReviewId::new(row.try_get("id")?),
        subject_id: ReviewSubjectId::new(row.try_get("subject_id")?),
        author_id: UserId::new(row.try_get("author_id")?),
        overall_rating: rating(row, "overall_rating")?,
        dimension_ratings,
        content: row.try_get("content")?,
        would_recommend: row.try_get("would_recommend")?,
        helpful_count: row.try_get("helpful_count")?,
        created_at: Timestamp::new(row.try_get("created_at")?),
    })
}

#[async_trait]
impl EngagementStore for SqliteDatabase {
    async fn create_user(&self, user: NewUser, now: Timestamp) -> AppResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, display_name, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(now.value())
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Username {} is already taken", user.username))
            }
            other => other,
        })?;

        Ok(User {
            id: UserId::new(result.last_insert_rowid()),
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            created_at: now,
        })
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn promote_to_thought_leader(
        &self,
        user: UserId,
        profile: NewThoughtLeader,
        now: Timestamp,
    ) -> AppResult<ThoughtLeader> {
        self.require_user(user).await?;
        let expertise = encode_list(&profile.expertise_areas)?;
        let result = sqlx::query(
            "INSERT INTO thought_leaders (user_id, title, organization, bio, expertise_areas, verified, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.value())
        .bind(&profile.title)
        .bind(&profile.organization)
        .bind(&profile.bio)
        .bind(expertise)
        .bind(profile.verified)
        .bind(now.value())
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("User {} is already a thought leader", user))
            }
            other => other,
        })?;

        Ok(ThoughtLeader {
            id: ThoughtLeaderId::new(result.last_insert_rowid()),
            user_id: user,
            title: profile.title,
            organization: profile.organization,
            bio: profile.bio,
            expertise_areas: profile.expertise_areas,
            verified: profile.verified,
            follower_count: 0,
            created_at: now,
        })
    }

    async fn get_thought_leader(&self, id: ThoughtLeaderId) -> AppResult<Option<ThoughtLeader>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM thought_leaders tl WHERE tl.id = ?",
            THOUGHT_LEADER_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(thought_leader_from_row).transpose()
    }

    async fn thought_leader_for_user(&self, user: UserId) -> AppResult<Option<ThoughtLeader>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM thought_leaders tl WHERE tl.user_id = ?",
            THOUGHT_LEADER_COLUMNS
        ))
        .bind(user.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(thought_leader_from_row).transpose()
    }

    async fn create_organization(
        &self,
        organization: NewOrganization,
        now: Timestamp,
    ) -> AppResult<Organization> {
        let result = sqlx::query(
            "INSERT INTO organizations (name, category, description, verified, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&organization.name)
        .bind(organization.category.as_str())
        .bind(&organization.description)
        .bind(organization.verified)
        .bind(now.value())
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Organization {} already exists",
                organization.name
            )),
            other => other,
        })?;

        Ok(Organization {
            id: OrganizationId::new(result.last_insert_rowid()),
            name: organization.name,
            category: organization.category,
            description: organization.description,
            verified: organization.verified,
            follower_count: 0,
            created_at: now,
        })
    }

    async fn get_organization(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM organizations o WHERE o.id = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(organization_from_row).transpose()
    }

    async fn add_organization_admin(
        &self,
        organization: OrganizationId,
        user: UserId,
    ) -> AppResult<()> {
        self.require_row("organizations", "Organization", organization.value())
            .await?;
        self.require_user(user).await?;
        sqlx::query("INSERT OR IGNORE INTO organization_admins (organization_id, user_id) VALUES (?, ?)")
            .bind(organization.value())
            .bind(user.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn managed_organizations(&self, user: UserId) -> AppResult<Vec<OrganizationId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT organization_id FROM organization_admins WHERE user_id = ? ORDER BY organization_id",
        )
        .bind(user.value())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(OrganizationId::new).collect())
    }

    async fn list_thought_leaders(&self, viewer: UserId) -> AppResult<Vec<ThoughtLeaderListing>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, u.display_name, \
             EXISTS (SELECT 1 FROM reactions f WHERE f.relation = 'thought_leader_follow' \
                     AND f.subject_id = tl.id AND f.actor_id = ?) AS is_subscribed \
             FROM thought_leaders tl JOIN users u ON u.id = tl.user_id \
             WHERE tl.verified = 1 \
             ORDER BY tl.follower_count DESC, tl.id ASC",
            THOUGHT_LEADER_COLUMNS
        ))
        .bind(viewer.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ThoughtLeaderListing {
                    thought_leader: thought_leader_from_row(row)?,
                    display_name: row.try_get("display_name")?,
                    is_subscribed: row.try_get::<i64, _>("is_subscribed")? != 0,
                })
            })
            .collect()
    }

    async fn list_organizations(
        &self,
        viewer: UserId,
        category: Option<OrganizationCategory>,
    ) -> AppResult<Vec<OrganizationListing>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {}, EXISTS (SELECT 1 FROM reactions f WHERE f.relation = 'organization_follow' \
             AND f.subject_id = o.id AND f.actor_id = ",
            ORGANIZATION_COLUMNS
        ));
        qb.push_bind(viewer.value());
        qb.push(") AS is_subscribed FROM organizations o WHERE o.verified = 1");
        if let Some(category) = category {
            qb.push(" AND o.category = ");
            qb.push_bind(category.as_str());
        }
        qb.push(" ORDER BY o.name ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(OrganizationListing {
                    organization: organization_from_row(row)?,
                    is_subscribed: row.try_get::<i64, _>("is_subscribed")? != 0,
                })
            })
            .collect()
    }

    async fn toggle_reaction(
        &self,
        relation: Reaction,
        subject: i64,
        actor: UserId,
        now: Timestamp,
    ) -> AppResult<MembershipToggle> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction takes the write lock before any read
        let removed = sqlx::query(
            "DELETE FROM reactions WHERE relation = ? AND subject_id = ? AND actor_id = ?",
        )
        .bind(relation.as_str())
        .bind(subject)
        .bind(actor.value())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let subject_exists = sqlx::query(&format!(
            "SELECT 1 FROM {} WHERE id = ?",
            relation.subject_table()
        ))
        .bind(subject)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
        if !subject_exists {
            return Err(AppError::not_found(relation.subject_name(), subject));
        }

        let delta: i64 = if removed {
            -1
        } else {
            let actor_exists = sqlx::query("SELECT 1 FROM users WHERE id = ?")
                .bind(actor.value())
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            if !actor_exists {
                return Err(AppError::not_found("User", actor));
            }

            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO reactions (relation, subject_id, actor_id, time_created) VALUES (?, ?, ?, ?)",
            )
            .bind(relation.as_str())
            .bind(subject)
            .bind(actor.value())
            .bind(now.value())
            .execute(&mut *tx)
            .await?
            .rows_affected();
            inserted as i64
        };

        if let Some(column) = relation.cached_counter() {
            if delta != 0 {
                sqlx::query(&format!(
                    "UPDATE {table} SET {col} = MAX(0, {col} + ?) WHERE id = ?",
                    table = relation.subject_table(),
                    col = column
                ))
                .bind(delta)
                .bind(subject)
                .execute(&mut *tx)
                .await?;
            }
        }

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reactions WHERE relation = ? AND subject_id = ?",
        )
        .bind(relation.as_str())
        .bind(subject)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(%relation, subject, %actor, removed, count, "reaction toggled");
        Ok(MembershipToggle {
            is_member: !removed,
            count,
        })
    }

    async fn toggle_topic_subscription(
        &self,
        actor: UserId,
        topic: &str,
        now: Timestamp,
    ) -> AppResult<MembershipToggle> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM topic_subscriptions WHERE subscriber_id = ? AND topic = ?")
            .bind(actor.value())
            .bind(topic)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            let actor_exists = sqlx::query("SELECT 1 FROM users WHERE id = ?")
                .bind(actor.value())
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            if !actor_exists {
                return Err(AppError::not_found("User", actor));
            }
            sqlx::query(
                "INSERT OR IGNORE INTO topic_subscriptions (subscriber_id, topic, time_created) VALUES (?, ?, ?)",
            )
            .bind(actor.value())
            .bind(topic)
            .bind(now.value())
            .execute(&mut *tx)
            .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topic_subscriptions WHERE topic = ?")
            .bind(topic)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(MembershipToggle {
            is_member: !removed,
            count,
        })
    }

    async fn reaction_count(&self, relation: Reaction, subject: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reactions WHERE relation = ? AND subject_id = ?",
        )
        .bind(relation.as_str())
        .bind(subject)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn cached_counter(&self, relation: Reaction, subject: i64) -> AppResult<Option<i64>> {
        let Some(column) = relation.cached_counter() else {
            return Ok(None);
        };
        let value: Option<i64> = sqlx::query_scalar(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            column,
            relation.subject_table()
        ))
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;
        match value {
            Some(value) => Ok(Some(value)),
            None => Err(AppError::not_found(relation.subject_name(), subject)),
        }
    }

    async fn refresh_counter(&self, relation: Reaction, subject: i64) -> AppResult<i64> {
        let Some(column) = relation.cached_counter() else {
            self.require_row(relation.subject_table(), relation.subject_name(), subject)
                .await?;
            return self.reaction_count(relation, subject).await;
        };

        let refreshed: Option<i64> = sqlx::query_scalar(&format!(
            "UPDATE {table} SET {col} = (SELECT COUNT(*) FROM reactions \
             WHERE relation = ? AND subject_id = {table}.id) WHERE id = ? RETURNING {col}",
            table = relation.subject_table(),
            col = column
        ))
        .bind(relation.as_str())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        refreshed.ok_or_else(|| AppError::not_found(relation.subject_name(), subject))
    }

    async fn subscriptions(&self, viewer: UserId) -> AppResult<SubscriptionSet> {
        let author_user_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT tl.user_id FROM reactions r JOIN thought_leaders tl ON tl.id = r.subject_id \
             WHERE r.relation = 'thought_leader_follow' AND r.actor_id = ? ORDER BY tl.user_id",
        )
        .bind(viewer.value())
        .fetch_all(&self.pool)
        .await?;

        let organization_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT subject_id FROM reactions WHERE relation = 'organization_follow' AND actor_id = ? \
             ORDER BY subject_id",
        )
        .bind(viewer.value())
        .fetch_all(&self.pool)
        .await?;

        let topics: Vec<String> = sqlx::query_scalar(
            "SELECT topic FROM topic_subscriptions WHERE subscriber_id = ? ORDER BY topic",
        )
        .bind(viewer.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(SubscriptionSet {
            author_user_ids: author_user_ids.into_iter().map(UserId::new).collect(),
            organization_ids: organization_ids.into_iter().map(OrganizationId::new).collect(),
            topics,
        })
    }

    async fn subscription_summary(&self, viewer: UserId) -> AppResult<SubscriptionSummary> {
        let row = sqlx::query(
            "SELECT \
               (SELECT COUNT(*) FROM reactions WHERE relation = 'thought_leader_follow' AND actor_id = ?) AS thought_leaders, \
               (SELECT COUNT(*) FROM reactions WHERE relation = 'organization_follow' AND actor_id = ?) AS organizations, \
               (SELECT COUNT(*) FROM topic_subscriptions WHERE subscriber_id = ?) AS topics",
        )
        .bind(viewer.value())
        .bind(viewer.value())
        .bind(viewer.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(SubscriptionSummary {
            thought_leaders: row.try_get("thought_leaders")?,
            organizations: row.try_get("organizations")?,
            topics: row.try_get("topics")?,
        })
    }

    async fn create_post(&self, post: NewPost, now: Timestamp) -> AppResult<Post> {
        let (author_user_id, author_organization_id) = post.author.to_columns();
        let topics = encode_list(&post.topics)?;
        let result = sqlx::query(
            "INSERT INTO posts (author_user_id, author_organization_id, post_type, title, body, external_link, topics, \
               title_folded, body_folded, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(author_user_id)
        .bind(author_organization_id)
        .bind(post.post_type.as_str())
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.external_link)
        .bind(topics)
        .bind(fold_search_text(&post.title))
        .bind(fold_search_text(&post.body))
        .bind(now.value())
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id: PostId::new(result.last_insert_rowid()),
            author: post.author,
            post_type: post.post_type,
            title: post.title,
            body: post.body,
            external_link: post.external_link,
            topics: post.topics,
            views: 0,
            created_at: now,
        })
    }

    async fn post_view(&self, id: PostId, viewer: UserId) -> AppResult<Option<PostView>> {
        let mut qb = post_view_query(viewer);
        qb.push(" AND p.id = ");
        qb.push_bind(id.value());
        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(post_view_from_row).transpose()
    }

    async fn increment_post_views(&self, id: PostId) -> AppResult<i64> {
        let views: Option<i64> =
            sqlx::query_scalar("UPDATE posts SET views = views + 1 WHERE id = ? RETURNING views")
                .bind(id.value())
                .fetch_optional(&self.pool)
                .await?;
        views.ok_or_else(|| AppError::not_found("Post", id))
    }

    async fn create_comment(
        &self,
        post: PostId,
        author: UserId,
        body: String,
        now: Timestamp,
    ) -> AppResult<Comment> {
        self.require_row("posts", "Post", post.value()).await?;
        self.require_user(author).await?;

        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post.value())
        .bind(author.value())
        .bind(&body)
        .bind(now.value())
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id: CommentId::new(result.last_insert_rowid()),
            post_id: post,
            author_id: author,
            body,
            created_at: now,
        })
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, author_id, body, created_at FROM comments WHERE id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn list_comments(&self, post: PostId, viewer: UserId) -> AppResult<Vec<CommentView>> {
        self.require_row("posts", "Post", post.value()).await?;

        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.author_id, c.body, c.created_at, u.display_name AS author_name, \
               (SELECT COUNT(*) FROM reactions lr WHERE lr.relation = 'comment_like' AND lr.subject_id = c.id) AS like_count, \
               EXISTS (SELECT 1 FROM reactions vr WHERE vr.relation = 'comment_like' \
                       AND vr.subject_id = c.id AND vr.actor_id = ?) AS liked_by_viewer \
             FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ? \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(viewer.value())
        .bind(post.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CommentView {
                    comment: comment_from_row(row)?,
                    author_name: row.try_get("author_name")?,
                    like_count: row.try_get("like_count")?,
                    liked_by_viewer: row.try_get::<i64, _>("liked_by_viewer")? != 0,
                })
            })
            .collect()
    }

    async fn feed_page(&self, query: &FeedQuery) -> AppResult<Vec<PostView>> {
        let mut qb = post_view_query(query.viewer);

        if let Some(subscriptions) = &query.subscriptions {
            // Union of the three criteria; each list is skipped when empty
            qb.push(" AND (0");
            if !subscriptions.author_user_ids.is_empty() {
                qb.push(" OR p.author_user_id IN (");
                let mut ids = qb.separated(", ");
                for id in &subscriptions.author_user_ids {
                    ids.push_bind(id.value());
                }
                qb.push(")");
            }
            if !subscriptions.organization_ids.is_empty() {
                // Legacy rows carrying both columns belong to their user author
                qb.push(" OR (p.author_user_id IS NULL AND p.author_organization_id IN (");
                let mut ids = qb.separated(", ");
                for id in &subscriptions.organization_ids {
                    ids.push_bind(id.value());
                }
                qb.push("))");
            }
            if !subscriptions.topics.is_empty() {
                qb.push(" OR EXISTS (SELECT 1 FROM json_each(p.topics) jt WHERE jt.value IN (");
                let mut topics = qb.separated(", ");
                for topic in &subscriptions.topics {
                    topics.push_bind(topic.clone());
                }
                qb.push("))");
            }
            qb.push(")");
        }

        if let Some(needle) = &query.search {
            push_search(&mut qb, ["p.title_folded", "p.body_folded"], needle);
        }

        if let Some(post_type) = query.post_type {
            qb.push(" AND p.post_type = ");
            qb.push_bind(post_type.as_str());
        }

        qb.push(" ORDER BY p.created_at DESC, p.id ASC LIMIT ");
        qb.push_bind(i64::from(query.limit));
        qb.push(" OFFSET ");
        qb.push_bind(query.offset as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(post_view_from_row).collect()
    }

    async fn create_company(&self, company: NewCompany, now: Timestamp) -> AppResult<Company> {
        let result = sqlx::query(
            "INSERT INTO companies (name, industry, verified, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&company.name)
        .bind(&company.industry)
        .bind(company.verified)
        .bind(now.value())
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Company {} already exists", company.name))
            }
            other => other,
        })?;

        Ok(Company {
            id: CompanyId::new(result.last_insert_rowid()),
            name: company.name,
            industry: company.industry,
            verified: company.verified,
            overall_rating: 0.0,
            recommend_to_friend_percentage: 0,
            ceo_approval_percentage: 0,
            total_reviews_count: 0,
            created_at: now,
        })
    }

    async fn get_company(&self, id: CompanyId) -> AppResult<Option<Company>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM companies c WHERE c.id = ?",
            COMPANY_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn create_company_review(
        &self,
        review: NewCompanyReview,
        now: Timestamp,
    ) -> AppResult<CompanyReview> {
        self.require_row("companies", "Company", review.company_id.value())
            .await?;
        self.require_user(review.author_id).await?;

        let input = review.review;
        let dims = input.dimensions;
        let result = sqlx::query(
            "INSERT INTO company_reviews (company_id, author_id, overall_rating, work_life_balance_rating, \
               culture_values_rating, career_opportunities_rating, compensation_benefits_rating, \
               senior_management_rating, title, pros, cons, advice_to_management, recommend_to_friend, \
               ceo_approval, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.company_id.value())
        .bind(review.author_id.value())
        .bind(i64::from(input.overall_rating))
        .bind(i64::from(dims.work_life_balance))
        .bind(i64::from(dims.culture_values))
        .bind(i64::from(dims.career_opportunities))
        .bind(i64::from(dims.compensation_benefits))
        .bind(i64::from(dims.senior_management))
        .bind(&input.title)
        .bind(&input.pros)
        .bind(&input.cons)
        .bind(&input.advice_to_management)
        .bind(input.recommend_to_friend)
        .bind(input.ceo_approval)
        .bind(now.value())
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "User {} has already reviewed company {}",
                review.author_id, review.company_id
            )),
            other => other,
        })?;

        Ok(CompanyReview {
            id: ReviewId::new(result.last_insert_rowid()),
            company_id: review.company_id,
            author_id: review.author_id,
            overall_rating: input.overall_rating,
            dimensions: dims,
            title: input.title,
            pros: input.pros,
            cons: input.cons,
            advice_to_management: input.advice_to_management,
            recommend_to_friend: input.recommend_to_friend,
            ceo_approval: input.ceo_approval,
            helpful_count: 0,
            created_at: now,
        })
    }

    async fn company_reviews(&self, company: CompanyId) -> AppResult<Vec<CompanyReview>> {
        self.require_row("companies", "Company", company.value()).await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM company_reviews r WHERE r.company_id = ? ORDER BY r.created_at DESC, r.id DESC",
            REVIEW_COLUMNS
        ))
        .bind(company.value())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(review_from_row).collect()
    }

    async fn store_company_aggregate(
        &self,
        company: CompanyId,
        snapshot: &AggregateSnapshot,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE companies SET overall_rating = ?, recommend_to_friend_percentage = ?, \
             ceo_approval_percentage = ?, total_reviews_count = ? WHERE id = ?",
        )
        .bind(snapshot.overall_rating)
        .bind(snapshot.recommend_to_friend_percentage)
        .bind(snapshot.ceo_approval_percentage)
        .bind(snapshot.review_count)
        .bind(company.value())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Company", company));
        }
        Ok(())
    }

    async fn create_forum_post(&self, post: NewForumPost, now: Timestamp) -> AppResult<ForumPost> {
        self.require_user(post.author_id).await?;
        let tags = encode_list(&post.tags)?;
        let result = sqlx::query(
            "INSERT INTO forum_posts (author_id, category, title, content, tags, title_folded, content_folded, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.author_id.value())
        .bind(post.category.as_str())
        .bind(&post.title)
        .bind(&post.content)
        .bind(tags)
        .bind(fold_search_text(&post.title))
        .bind(fold_search_text(&post.content))
        .bind(now.value())
        .execute(&self.pool)
        .await?;

        Ok(ForumPost {
            id: ForumPostId::new(result.last_insert_rowid()),
            author_id: post.author_id,
            category: post.category,
            title: post.title,
            content: post.content,
            tags: post.tags,
            views: 0,
            created_at: now,
        })
    }

    async fn forum_post_view(
        &self,
        id: ForumPostId,
        viewer: UserId,
    ) -> AppResult<Option<ForumPostView>> {
        let mut qb = forum_view_query(viewer);
        qb.push(" AND f.id = ");
        qb.push_bind(id.value());
        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(forum_post_view_from_row).transpose()
    }

    async fn increment_forum_post_views(&self, id: ForumPostId) -> AppResult<i64> {
        let views: Option<i64> = sqlx::query_scalar(
            "UPDATE forum_posts SET views = views + 1 WHERE id = ? RETURNING views",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        views.ok_or_else(|| AppError::not_found("Forum post", id))
    }

    async fn forum_page(&self, query: &ForumQuery) -> AppResult<Vec<ForumPostView>> {
        let mut qb = forum_view_query(query.viewer);

        if let Some(needle) = &query.search {
            push_search(&mut qb, ["f.title_folded", "f.content_folded"], needle);
        }
        if let Some(category) = query.category {
            qb.push(" AND f.category = ");
            qb.push_bind(category.as_str());
        }

        qb.push(" ORDER BY f.created_at DESC, f.id ASC LIMIT ");
        qb.push_bind(i64::from(query.limit));
        qb.push(" OFFSET ");
        qb.push_bind(query.offset as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(forum_post_view_from_row).collect()
    }

    async fn create_reply(
        &self,
        post: ForumPostId,
        author: UserId,
        content: String,
        now: Timestamp,
    ) -> AppResult<Reply> {
        self.require_row("forum_posts", "Forum post", post.value())
            .await?;
        self.require_user(author).await?;

        let result = sqlx::query(
            "INSERT INTO replies (post_id, author_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post.value())
        .bind(author.value())
        .bind(&content)
        .bind(now.value())
        .execute(&self.pool)
        .await?;

        Ok(Reply {
            id: ReplyId::new(result.last_insert_rowid()),
            post_id: post,
            author_id: author,
            content,
            created_at: now,
        })
    }

    async fn list_replies(&self, post: ForumPostId, viewer: UserId) -> AppResult<Vec<ReplyView>> {
        self.require_row("forum_posts", "Forum post", post.value())
            .await?;

        let rows = sqlx::query(
            "SELECT r.id, r.post_id, r.author_id, r.content, r.created_at, u.display_name AS author_name, \
               (SELECT COUNT(*) FROM reactions lr WHERE lr.relation = 'reply_like' AND lr.subject_id = r.id) AS like_count, \
               EXISTS (SELECT 1 FROM reactions vr WHERE vr.relation = 'reply_like' \
                       AND vr.subject_id = r.id AND vr.actor_id = ?) AS liked_by_viewer \
             FROM replies r JOIN users u ON u.id = r.author_id \
             WHERE r.post_id = ? \
             ORDER BY r.created_at ASC, r.id ASC",
        )
        .bind(viewer.value())
        .bind(post.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ReplyView {
                    reply: reply_from_row(row)?,
                    author_name: row.try_get("author_name")?,
                    like_count: row.try_get("like_count")?,
                    liked_by_viewer: row.try_get::<i64, _>("liked_by_viewer")? != 0,
                })
            })
            .collect()
    }

    async fn create_review_subject(
        &self,
        subject: NewReviewSubject,
        now: Timestamp,
    ) -> AppResult<ReviewSubject> {
        let result = sqlx::query("INSERT INTO review_subjects (kind, name, created_at) VALUES (?, ?, ?)")
            .bind(subject.kind.as_str())
            .bind(&subject.name)
            .bind(now.value())
            .execute(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict(format!(
                    "{} {} already exists",
                    subject.kind.as_str(),
                    subject.name
                )),
                other => other,
            })?;

        Ok(ReviewSubject {
            id: ReviewSubjectId::new(result.last_insert_rowid()),
            kind: subject.kind,
            name: subject.name,
            review_count: 0,
            average_rating: 0.0,
            recommend_percentage: 0,
            created_at: now,
        })
    }

    async fn get_review_subject(&self, id: ReviewSubjectId) -> AppResult<Option<ReviewSubject>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM review_subjects s WHERE s.id = ?",
            REVIEW_SUBJECT_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(review_subject_from_row).transpose()
    }

    async fn create_entity_review(
        &self,
        review: NewEntityReview,
        now: Timestamp,
    ) -> AppResult<EntityReview> {
        self.require_row("review_subjects", "Review subject", review.subject_id.value())
            .await?;
        self.require_user(review.author_id).await?;

        let input = review.review;
        let dimensions = serde_json::to_string(&input.dimension_ratings)
            .map_err(|e| AppError::Internal(format!("Failed to encode ratings: {}", e)))?;
        let result = sqlx::query(
            "INSERT INTO entity_reviews (subject_id, author_id, overall_rating, dimension_ratings, content, \
               would_recommend, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.subject_id.value())
        .bind(review.author_id.value())
        .bind(i64::from(input.overall_rating))
        .bind(dimensions)
        .bind(&input.content)
        .bind(input.would_recommend)
        .bind(now.value())
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "User {} has already reviewed subject {}",
                review.author_id, review.subject_id
            )),
            other => other,
        })?;

        Ok(EntityReview {
            id: EntityReviewId::new(result.last_insert_rowid()),
            subject_id: review.subject_id,
            author_id: review.author_id,
            overall_rating: input.overall_rating,
            dimension_ratings: input.dimension_ratings,
            content: input.content,
            would_recommend: input.would_recommend,
            helpful_count: 0,
            created_at: now,
        })
    }

    async fn entity_reviews(&self, subject: ReviewSubjectId) -> AppResult<Vec<EntityReview>> {
        self.require_row("review_subjects", "Review subject", subject.value())
            .await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM entity_reviews er WHERE er.subject_id = ? ORDER BY er.created_at DESC, er.id DESC",
            ENTITY_REVIEW_COLUMNS
        ))
        .bind(subject.value())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entity_review_from_row).collect()
    }

    async fn store_entity_aggregate(
        &self,
        subject: ReviewSubjectId,
        aggregate: &EntityAggregate,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE review_subjects SET review_count = ?, average_rating = ?, recommend_percentage = ? \
             WHERE id = ?",
        )
        .bind(aggregate.review_count)
        .bind(aggregate.average_rating)
        .bind(aggregate.recommend_percentage)
        .bind(subject.value())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Review subject", subject));
        }
        Ok(())
    }
}
