mod common;

use std::collections::HashSet;

use common::Fixture;
use engg_engagement::{
    core::{Author, FollowTarget, LikeTarget, PostId},
    models::{FeedFilters, OrganizationCategory, PostType},
};

fn ids(items: &[engg_engagement::models::PostView]) -> Vec<PostId> {
    items.iter().map(|p| p.post.id).collect()
}

#[tokio::test]
async fn test_viewer_without_subscriptions_gets_discovery_mode() {
    let fx = Fixture::new().await;
    let author = fx.user("author").await;
    let org = fx.organization("PEC").await;
    let viewer = fx.user("viewer").await;
    let p1 = fx.post_at(Author::User(author), "One", &["civil"], 10).await;
    let p2 = fx.post_at(Author::Organization(org), "Two", &[], 20).await;

    let page = fx
        .state
        .feed
        .get_feed(viewer, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert!(page.discovery_mode);
    assert_eq!(ids(&page.items), vec![p2, p1]);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_topic_subscription_matches_independent_of_author() {
    let fx = Fixture::new().await;
    let stranger = fx.user("stranger").await;
    let viewer = fx.user("viewer").await;
    let p1 = fx
        .post_at(Author::User(stranger), "Rust at scale", &["software", "career"], 10)
        .await;
    fx.post_at(Author::User(stranger), "Bridges", &["civil"], 20)
        .await;
    fx.post_at(Author::User(stranger), "No topics", &[], 30).await;

    fx.state
        .aggregator
        .toggle_follow(FollowTarget::Topic("software".to_string()), viewer)
        .await
        .unwrap();

    let page = fx
        .state
        .feed
        .get_feed(viewer, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert!(!page.discovery_mode);
    assert_eq!(ids(&page.items), vec![p1]);
}

#[tokio::test]
async fn test_organization_follow_scenario() {
    let fx = Fixture::new().await;
    let org = fx.organization("Pakistan Engineering Council").await;
    let a = fx.user("a").await;
    let b = fx.user("b").await;
    let other = fx.user("other").await;
    let p1 = fx.post_at(Author::Organization(org), "Licensing update", &[], 10).await;
    let p2 = fx.post_at(Author::User(other), "Unrelated", &[], 20).await;

    fx.state
        .aggregator
        .toggle_follow(FollowTarget::Organization(org), a)
        .await
        .unwrap();

    let for_a = fx
        .state
        .feed
        .get_feed(a, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert!(!for_a.discovery_mode);
    assert_eq!(ids(&for_a.items), vec![p1]);

    let for_b = fx
        .state
        .feed
        .get_feed(b, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert!(for_b.discovery_mode);
    assert_eq!(ids(&for_b.items), vec![p2, p1]);
}

#[tokio::test]
async fn test_thought_leader_follow_matches_authored_posts() {
    let fx = Fixture::new().await;
    let (leader_user, leader) = fx.thought_leader("leader").await;
    let other = fx.user("other").await;
    let viewer = fx.user("viewer").await;
    let p1 = fx.post_at(Author::User(leader_user), "Leader post", &[], 10).await;
    fx.post_at(Author::User(other), "Other post", &[], 20).await;

    fx.state
        .aggregator
        .toggle_follow(FollowTarget::ThoughtLeader(leader), viewer)
        .await
        .unwrap();

    let page = fx
        .state
        .feed
        .get_feed(viewer, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![p1]);
    assert!(page.items[0].author_is_verified);
    assert_eq!(page.items[0].author_name, "leader (display)");
}

#[tokio::test]
async fn test_union_of_criteria_has_no_duplicates() {
    let fx = Fixture::new().await;
    let (leader_user, leader) = fx.thought_leader("leader").await;
    let org = fx.organization("NUST").await;
    let viewer = fx.user("viewer").await;
    // Matches on author and on topic; must appear once
    let p1 = fx
        .post_at(Author::User(leader_user), "Both", &["software"], 10)
        .await;
    let p2 = fx.post_at(Author::Organization(org), "Org", &["software"], 20).await;

    let agg = &fx.state.aggregator;
    agg.toggle_follow(FollowTarget::ThoughtLeader(leader), viewer)
        .await
        .unwrap();
    agg.toggle_follow(FollowTarget::Organization(org), viewer)
        .await
        .unwrap();
    agg.toggle_follow(FollowTarget::Topic("software".to_string()), viewer)
        .await
        .unwrap();

    let page = fx
        .state
        .feed
        .get_feed(viewer, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![p2, p1]);

    let summary = fx.state.feed.subscription_summary(viewer).await.unwrap();
    assert_eq!(summary.thought_leaders, 1);
    assert_eq!(summary.organizations, 1);
    assert_eq!(summary.topics, 1);
}

#[tokio::test]
async fn test_pages_are_disjoint_and_ordered() {
    let fx = Fixture::new().await;
    let author = fx.user("author").await;
    let viewer = fx.user("viewer").await;
    for i in 0..25 {
        fx.post_at(Author::User(author), &format!("Post {}", i), &[], 100 + i)
            .await;
    }
    let feed = &fx.state.feed;

    let mut seen = HashSet::new();
    let mut previous_time = i64::MAX;
    let mut sizes = Vec::new();
    for page_no in 1..=3 {
        let page = feed
            .get_feed(viewer, &FeedFilters::default(), page_no)
            .await
            .unwrap();
        assert_eq!(page.page, page_no);
        assert_eq!(page.has_next, page_no < 3);
        sizes.push(page.items.len());
        for item in &page.items {
            assert!(seen.insert(item.post.id), "post repeated across pages");
            assert!(item.post.created_at.value() <= previous_time);
            previous_time = item.post.created_at.value();
        }
    }
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(seen.len(), 25);

    let past_end = feed
        .get_feed(viewer, &FeedFilters::default(), 4)
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert!(!past_end.has_next);

    let zero = feed
        .get_feed(viewer, &FeedFilters::default(), 0)
        .await
        .unwrap();
    let first = feed
        .get_feed(viewer, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert_eq!(zero.page, 1);
    assert_eq!(ids(&zero.items), ids(&first.items));
}

#[tokio::test]
async fn test_exact_page_boundary_has_no_next() {
    let fx = Fixture::with_page_size(3).await;
    let author = fx.user("author").await;
    for i in 0..3 {
        fx.post_at(Author::User(author), &format!("P{}", i), &[], i).await;
    }
    let page = fx
        .state
        .feed
        .get_feed(author, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.page_size, 3);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_equal_timestamps_keep_insertion_order() {
    let fx = Fixture::new().await;
    let author = fx.user("author").await;
    let first = fx.post_at(Author::User(author), "First", &[], 500).await;
    let second = fx.post_at(Author::User(author), "Second", &[], 500).await;
    let third = fx.post_at(Author::User(author), "Third", &[], 500).await;
    let newest = fx.post_at(Author::User(author), "Newest", &[], 600).await;

    let page = fx
        .state
        .feed
        .get_feed(author, &FeedFilters::default(), 1)
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![newest, first, second, third]);
}

#[tokio::test]
async fn test_search_and_type_filters() {
    let fx = Fixture::new().await;
    let author = fx.user("author").await;
    let viewer = fx.user("viewer").await;
    let django = fx
        .typed_post_at(
            Author::User(author),
            PostType::Article,
            "Scaling Django",
            "Notes from production",
            &[],
            10,
        )
        .await;
    let job = fx
        .typed_post_at(
            Author::User(author),
            PostType::Job,
            "Backend role",
            "We use DJANGO and Postgres",
            &[],
            20,
        )
        .await;
    fx.typed_post_at(
        Author::User(author),
        PostType::Job,
        "Site engineer",
        "Civil works",
        &[],
        30,
    )
    .await;
    let feed = &fx.state.feed;

    let search = FeedFilters {
        search: Some("  django ".to_string()),
        post_type: None,
    };
    let page = feed.get_feed(viewer, &search, 1).await.unwrap();
    assert_eq!(ids(&page.items), vec![job, django]);

    let jobs_about_django = FeedFilters {
        search: Some("Django".to_string()),
        post_type: Some(PostType::Job),
    };
    let page = feed.get_feed(viewer, &jobs_about_django, 1).await.unwrap();
    assert_eq!(ids(&page.items), vec![job]);

    let no_match = FeedFilters {
        search: Some("kubernetes".to_string()),
        post_type: None,
    };
    assert!(feed
        .get_feed(viewer, &no_match, 1)
        .await
        .unwrap()
        .items
        .is_empty());
}

#[tokio::test]
async fn test_search_matches_accented_titles_in_any_case() {
    let fx = Fixture::new().await;
    let author = fx.user("author").await;
    let viewer = fx.user("viewer").await;
    let bridge = fx
        .post_at(Author::User(author), "ÖZTÜRK Bridge Design", &[], 10)
        .await;
    fx.post_at(Author::User(author), "Ozturk without marks", &[], 20)
        .await;

    for needle in ["ÖZTÜRK", "öztürk", "Öztürk BRIDGE"] {
        let filters = FeedFilters {
            search: Some(needle.to_string()),
            post_type: None,
        };
        let page = fx.state.feed.get_feed(viewer, &filters, 1).await.unwrap();
        assert_eq!(ids(&page.items), vec![bridge], "needle {}", needle);
    }
}

#[tokio::test]
async fn test_filters_apply_inside_subscription_set() {
    let fx = Fixture::new().await;
    let stranger = fx.user("stranger").await;
    let viewer = fx.user("viewer").await;
    fx.post_at(Author::User(stranger), "Django tips", &["civil"], 10)
        .await;
    let wanted = fx
        .post_at(Author::User(stranger), "Django tips too", &["software"], 20)
        .await;

    fx.state
        .aggregator
        .toggle_follow(FollowTarget::Topic("software".to_string()), viewer)
        .await
        .unwrap();

    let filters = FeedFilters {
        search: Some("django".to_string()),
        post_type: None,
    };
    let page = fx.state.feed.get_feed(viewer, &filters, 1).await.unwrap();
    assert_eq!(ids(&page.items), vec![wanted]);
}

#[tokio::test]
async fn test_feed_items_carry_counts_and_viewer_flag() {
    let fx = Fixture::new().await;
    let author = fx.user("author").await;
    let viewer = fx.user("viewer").await;
    let other = fx.user("other").await;
    let post = fx.post_at(Author::User(author), "Counted", &[], 10).await;
    let quiet = fx.post_at(Author::User(author), "Quiet", &[], 5).await;
    let agg = &fx.state.aggregator;

    agg.toggle_like(LikeTarget::Post(post), viewer).await.unwrap();
    agg.toggle_like(LikeTarget::Post(post), other).await.unwrap();
    agg.create_comment(post, other, "nice").await.unwrap();

    let page = fx
        .state
        .feed
        .get_feed(viewer, &FeedFilters::default(), 1)
        .await
        .unwrap();
    let counted = &page.items[0];
    assert_eq!(counted.post.id, post);
    assert_eq!(counted.like_count, 2);
    assert_eq!(counted.comment_count, 1);
    assert!(counted.liked_by_viewer);
    assert!(!counted.author_is_verified);

    let silent = &page.items[1];
    assert_eq!(silent.post.id, quiet);
    assert_eq!(silent.like_count, 0);
    assert!(!silent.liked_by_viewer);
}

#[tokio::test]
async fn test_discovery_lists_flag_subscriptions() {
    let fx = Fixture::new().await;
    let (_, popular) = fx.thought_leader("popular").await;
    let (_, quiet) = fx.thought_leader("quiet").await;
    let pec = fx.organization("PEC").await;
    let viewer = fx.user("viewer").await;
    let fan = fx.user("fan").await;
    let agg = &fx.state.aggregator;

    agg.toggle_follow(FollowTarget::ThoughtLeader(popular), viewer)
        .await
        .unwrap();
    agg.toggle_follow(FollowTarget::ThoughtLeader(popular), fan)
        .await
        .unwrap();
    agg.toggle_follow(FollowTarget::Organization(pec), viewer)
        .await
        .unwrap();

    let leaders = fx.state.feed.thought_leaders(viewer).await.unwrap();
    assert_eq!(leaders.len(), 2);
    assert_eq!(leaders[0].thought_leader.id, popular);
    assert_eq!(leaders[0].thought_leader.follower_count, 2);
    assert!(leaders[0].is_subscribed);
    assert_eq!(leaders[1].thought_leader.id, quiet);
    assert!(!leaders[1].is_subscribed);

    let orgs = fx.state.feed.organizations(viewer, None).await.unwrap();
    assert_eq!(orgs.len(), 1);
    assert!(orgs[0].is_subscribed);

    let universities = fx
        .state
        .feed
        .organizations(viewer, Some(OrganizationCategory::University))
        .await
        .unwrap();
    assert!(universities.is_empty());

    let organization = fx.store().get_organization(pec).await.unwrap().unwrap();
    assert_eq!(organization.follower_count, 1);
}
