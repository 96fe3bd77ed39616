// Sample data for local runs: thought leaders, organizations, a reader with
// subscriptions, a stream of posts, a reviewed company, forum threads and
// reviewed programs and supervisors

use tracing::{info, warn};

use crate::{
    app_state::AppState,
    core::{FollowTarget, LikeTarget, Timestamp, UserId},
    error::{AppError, AppResult},
    infrastructure::EngagementStore,
    models::{
        CompanyReviewInput, CreateForumPostRequest, CreatePostRequest, DimensionRatings,
        EntityReviewInput, ForumCategory, NewCompany, NewOrganization, NewReviewSubject,
        NewThoughtLeader, NewUser, OrganizationCategory, PostType, ReviewSubjectKind, Role,
    },
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub organizations: usize,
    pub posts: usize,
    pub reviews: usize,
    pub forum_posts: usize,
    pub entity_reviews: usize,
}

const POST_COUNT: usize = 25;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn create_user(
    store: &dyn EngagementStore,
    username: &str,
    display_name: &str,
    role: Role,
) -> AppResult<UserId> {
    let user = store
        .create_user(
            NewUser {
                username: username.to_string(),
                display_name: display_name.to_string(),
                role,
            },
            Timestamp::now(),
        )
        .await?;
    Ok(user.id)
}

/// Populate an empty database. A database that already holds the sample
/// users is left untouched.
pub async fn seed_sample_data(state: &AppState) -> AppResult<SeedSummary> {
    let store: &dyn EngagementStore = state.database.as_ref();
    let mut summary = SeedSummary::default();

    let leaders = [
        ("john_doe", "John Doe", "Senior Software Engineer", "Google",
         "Expert in distributed systems and cloud architecture.",
         &["python", "django", "kubernetes", "aws"][..]),
        ("jane_smith", "Jane Smith", "Lead Electrical Engineer", "Tesla",
         "Passionate about renewable energy and sustainable power systems",
         &["power systems", "renewable energy", "circuit design"][..]),
        ("ali_khan", "Ali Khan", "Chief Technology Officer", "Systems Limited",
         "Building the next generation of Pakistani tech companies",
         &["leadership", "strategy", "innovation"][..]),
    ];

    let mut leader_users = Vec::with_capacity(leaders.len());
    let mut leader_profiles = Vec::with_capacity(leaders.len());
    for (username, name, title, organization, bio, areas) in leaders {
        let user = match create_user(store, username, name, Role::Professional).await {
            Ok(user) => user,
            Err(AppError::Conflict(_)) => {
                warn!("Sample data already present, skipping seed");
                return Ok(summary);
            }
            Err(err) => return Err(err),
        };
        let profile = store
            .promote_to_thought_leader(
                user,
                NewThoughtLeader {
                    title: title.to_string(),
                    organization: organization.to_string(),
                    bio: bio.to_string(),
                    expertise_areas: strings(areas),
                    verified: true,
                },
                Timestamp::now(),
            )
            .await?;
        leader_users.push(user);
        leader_profiles.push(profile.id);
        summary.users += 1;
    }

    let org_admin = create_user(store, "systems_hr", "Systems HR", Role::Professional).await?;
    let reader = create_user(store, "testuser", "Test User", Role::Student).await?;
    summary.users += 2;

    let organizations = [
        ("Pakistan Engineering Council", OrganizationCategory::Association,
         "The regulatory body for the engineering profession in Pakistan."),
        ("NUST", OrganizationCategory::University,
         "National University of Sciences and Technology"),
        ("Systems Limited", OrganizationCategory::Company,
         "Pakistani software development company with global clients"),
        ("LUMS", OrganizationCategory::University,
         "Lahore University of Management Sciences"),
    ];
    let mut systems_limited = None;
    for (name, category, description) in organizations {
        let org = store
            .create_organization(
                NewOrganization {
                    name: name.to_string(),
                    category,
                    description: description.to_string(),
                    verified: true,
                },
                Timestamp::now(),
            )
            .await?;
        if name == "Systems Limited" {
            systems_limited = Some(org.id);
        }
        summary.organizations += 1;
    }
    let systems_limited = systems_limited
        .ok_or_else(|| AppError::Internal("Systems Limited was not created".to_string()))?;
    store.add_organization_admin(systems_limited, org_admin).await?;

    // The reader follows two leaders and one topic
    for profile in &leader_profiles[..2] {
        state
            .aggregator
            .toggle_follow(FollowTarget::ThoughtLeader(*profile), reader)
            .await?;
    }
    state
        .aggregator
        .toggle_follow(FollowTarget::Topic("career".to_string()), reader)
        .await?;

    for idx in 0..POST_COUNT {
        let (author, request) = match idx % 3 {
            0 => (
                leader_users[0],
                CreatePostRequest {
                    post_type: PostType::Article,
                    title: format!("Software Architecture Patterns #{}", idx + 1),
                    body: "Microservices, event-driven design, CQRS and the scalability \
                           trade-offs every senior engineer should know."
                        .to_string(),
                    topics: strings(&["software", "architecture", "engineering"]),
                    ..Default::default()
                },
            ),
            1 => (
                leader_users[1],
                CreatePostRequest {
                    post_type: PostType::Insight,
                    title: format!("Renewable Energy in Pakistan #{}", idx + 1),
                    body: "Current capacity, government initiatives and the technical \
                           challenges of the renewable transition."
                        .to_string(),
                    topics: strings(&["renewable", "energy", "pakistan"]),
                    ..Default::default()
                },
            ),
            _ => (
                org_admin,
                CreatePostRequest {
                    post_type: PostType::Job,
                    title: format!("Engineering Positions Open #{}", idx + 1),
                    body: "Openings for software, DevOps, data and QA engineers.".to_string(),
                    topics: strings(&["jobs", "career", "pakistan"]),
                    organization_id: Some(systems_limited),
                    ..Default::default()
                },
            ),
        };
        let post = state.aggregator.create_post(author, request).await?;
        if idx % 2 == 0 {
            state
                .aggregator
                .toggle_like(LikeTarget::Post(post.id), reader)
                .await?;
        }
        summary.posts += 1;
    }

    let company = store
        .create_company(
            NewCompany {
                name: "Systems Limited".to_string(),
                industry: "Software".to_string(),
                verified: true,
            },
            Timestamp::now(),
        )
        .await?;
    let reviews = [
        (leader_users[2], 4, [4, 4, 5, 3, 4], true, Some(true)),
        (reader, 3, [3, 4, 3, 2, 3], false, None),
    ];
    for (author, overall, dims, recommend, ceo) in reviews {
        state
            .aggregator
            .create_review(
                company.id,
                author,
                CompanyReviewInput {
                    overall_rating: overall,
                    dimensions: DimensionRatings::from_array(dims),
                    title: "Learning-focused workplace".to_string(),
                    pros: "Strong engineering culture".to_string(),
                    cons: "Deadlines can be tight".to_string(),
                    advice_to_management: None,
                    recommend_to_friend: recommend,
                    ceo_approval: ceo,
                },
            )
            .await?;
        summary.reviews += 1;
    }

    let threads = [
        (ForumCategory::Career, "Preparing for the PEC engineering practice exam",
         "Which books and past papers helped you most?", &["pec", "exams"][..]),
        (ForumCategory::Scholarships, "Fully funded MS options in Germany",
         "Sharing my DAAD timeline and asking for advice on the SOP.", &["daad", "ms"][..]),
        (ForumCategory::Technical, "Öztürk method for cable-stayed bridge analysis",
         "Has anyone applied this in a final year project?", &["structures"][..]),
    ];
    for (category, title, content, tags) in threads {
        let post = state
            .aggregator
            .create_forum_post(
                reader,
                CreateForumPostRequest {
                    category,
                    title: title.to_string(),
                    content: content.to_string(),
                    tags: strings(tags),
                },
            )
            .await?;
        state
            .aggregator
            .create_reply(post.id, leader_users[0], "Start with the official syllabus and past papers.")
            .await?;
        state
            .aggregator
            .toggle_like(LikeTarget::ForumPost(post.id), leader_users[1])
            .await?;
        summary.forum_posts += 1;
    }

    let program = store
        .create_review_subject(
            NewReviewSubject {
                kind: ReviewSubjectKind::Program,
                name: "NUST MS Electrical Engineering".to_string(),
            },
            Timestamp::now(),
        )
        .await?;
    let supervisor = store
        .create_review_subject(
            NewReviewSubject {
                kind: ReviewSubjectKind::Supervisor,
                name: "Dr. Ayesha Siddiqui".to_string(),
            },
            Timestamp::now(),
        )
        .await?;
    state
        .aggregator
        .create_entity_review(
            program.id,
            reader,
            EntityReviewInput {
                overall_rating: 4,
                dimension_ratings: Default::default(),
                content: "Strong labs, heavy coursework.".to_string(),
                would_recommend: Some(true),
            },
        )
        .await?;
    state
        .aggregator
        .create_entity_review(
            supervisor.id,
            reader,
            EntityReviewInput {
                overall_rating: 5,
                dimension_ratings: [
                    ("availability".to_string(), 4),
                    ("guidance_quality".to_string(), 5),
                    ("research_environment".to_string(), 5),
                ]
                .into_iter()
                .collect(),
                content: "Weekly meetings and clear feedback.".to_string(),
                would_recommend: Some(true),
            },
        )
        .await?;
    summary.entity_reviews += 2;

    info!(
        users = summary.users,
        organizations = summary.organizations,
        posts = summary.posts,
        reviews = summary.reviews,
        forum_posts = summary.forum_posts,
        entity_reviews = summary.entity_reviews,
        "sample data seeded"
    );
    Ok(summary)
}
