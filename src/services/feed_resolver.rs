// Feed Resolver - which posts a viewer sees, in what order, one page at a time

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::UserId;
use crate::error::AppResult;
use crate::infrastructure::EngagementStore;
use crate::models::{
    fold_search_text, FeedFilters, FeedPage, FeedQuery, ForumFilters, ForumPostView, ForumQuery,
    OrganizationCategory, OrganizationListing, PostView, SubscriptionSummary,
    ThoughtLeaderListing,
};

#[derive(Clone)]
pub struct FeedResolver {
    store: Arc<dyn EngagementStore>,
    page_size: u32,
    forum_page_size: u32,
}

/// Trimmed, folded search needle; blank input means no search
fn search_needle(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(fold_search_text)
}

impl FeedResolver {
    pub fn new(store: Arc<dyn EngagementStore>, page_size: u32, forum_page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            forum_page_size: forum_page_size.max(1),
        }
    }

    /// One page of the viewer's feed.
    ///
    /// A viewer who follows nothing gets discovery mode: every post is
    /// eligible. Otherwise a post is visible when its author, its
    /// organization or any of its topics is followed. Pages are 1-based;
    /// page 0 is read as page 1 and pages past the end come back empty.
    #[instrument(skip(self, filters))]
    pub async fn get_feed(
        &self,
        viewer: UserId,
        filters: &FeedFilters,
        page: u32,
    ) -> AppResult<FeedPage<PostView>> {
        let page = page.max(1);
        let subscriptions = self.store.subscriptions(viewer).await?;
        let discovery_mode = subscriptions.is_empty();

        let search = search_needle(filters.search.as_deref());

        // One extra row tells us whether another page follows
        let query = FeedQuery {
            viewer,
            subscriptions: if discovery_mode {
                None
            } else {
                Some(subscriptions)
            },
            search,
            post_type: filters.post_type,
            limit: self.page_size + 1,
            offset: u64::from(page - 1) * u64::from(self.page_size),
        };

        let mut items = self.store.feed_page(&query).await?;
        let has_next = items.len() > self.page_size as usize;
        items.truncate(self.page_size as usize);

        debug!(
            %viewer,
            page,
            discovery_mode,
            returned = items.len(),
            has_next,
            "feed page resolved"
        );

        Ok(FeedPage {
            items,
            page,
            page_size: self.page_size,
            has_next,
            discovery_mode,
        })
    }

    /// One page of forum threads, newest first, across every category unless filtered
    #[instrument(skip(self, filters))]
    pub async fn forum_page(
        &self,
        viewer: UserId,
        filters: &ForumFilters,
        page: u32,
    ) -> AppResult<FeedPage<ForumPostView>> {
        let page = page.max(1);
        let query = ForumQuery {
            viewer,
            search: search_needle(filters.search.as_deref()),
            category: filters.category,
            limit: self.forum_page_size + 1,
            offset: u64::from(page - 1) * u64::from(self.forum_page_size),
        };

        let mut items = self.store.forum_page(&query).await?;
        let has_next = items.len() > self.forum_page_size as usize;
        items.truncate(self.forum_page_size as usize);
        debug!(%viewer, page, returned = items.len(), has_next, "forum page resolved");

        Ok(FeedPage {
            items,
            page,
            page_size: self.forum_page_size,
            has_next,
            discovery_mode: false,
        })
    }

    pub async fn subscription_summary(&self, viewer: UserId) -> AppResult<SubscriptionSummary> {
        self.store.subscription_summary(viewer).await
    }

    /// Verified thought leaders, most followed first
    pub async fn thought_leaders(&self, viewer: UserId) -> AppResult<Vec<ThoughtLeaderListing>> {
        self.store.list_thought_leaders(viewer).await
    }

    /// Verified organizations by name, optionally limited to one category
    pub async fn organizations(
        &self,
        viewer: UserId,
        category: Option<OrganizationCategory>,
    ) -> AppResult<Vec<OrganizationListing>> {
        self.store.list_organizations(viewer, category).await
    }
}
