// Feed and subscription types

use serde::{Deserialize, Serialize};

use crate::core::{OrganizationId, UserId};
use crate::models::content::PostType;

/// What a viewer follows, resolved to the columns posts are matched on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionSet {
    /// Users behind the thought leaders the viewer follows
    pub author_user_ids: Vec<UserId>,
    pub organization_ids: Vec<OrganizationId>,
    pub topics: Vec<String>,
}

impl SubscriptionSet {
    pub fn is_empty(&self) -> bool {
        self.author_user_ids.is_empty() && self.organization_ids.is_empty() && self.topics.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub thought_leaders: i64,
    pub organizations: i64,
    pub topics: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedFilters {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub post_type: Option<PostType>,
}

/// Store-level feed query: one window over the filtered, ordered post set
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub viewer: UserId,
    /// `None` means discovery mode: every post is visible
    pub subscriptions: Option<SubscriptionSet>,
    /// Case-folded search needle, see [`fold_search_text`]
    pub search: Option<String>,
    pub post_type: Option<PostType>,
    pub limit: u32,
    pub offset: u64,
}

/// Fold text for case-insensitive substring search.
///
/// Posts and threads store folded copies of their title and body, and search
/// needles are folded the same way, so matching works beyond ASCII.
pub fn fold_search_text(text: &str) -> String {
    text.to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub discovery_mode: bool,
}

/// Result of flipping one actor's membership in an edge set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipToggle {
    pub is_member: bool,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: i64,
}

impl From<MembershipToggle> for LikeOutcome {
    fn from(toggle: MembershipToggle) -> Self {
        Self {
            liked: toggle.is_member,
            like_count: toggle.count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowOutcome {
    pub following: bool,
    pub follower_count: i64,
}

impl From<MembershipToggle> for FollowOutcome {
    fn from(toggle: MembershipToggle) -> Self {
        Self {
            following: toggle.is_member,
            follower_count: toggle.count,
        }
    }
}
