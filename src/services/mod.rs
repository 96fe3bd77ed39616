// Services - business logic above the store
pub mod engagement_aggregator;
pub mod feed_resolver;
pub mod validation;

pub use engagement_aggregator::{
    average_of_dimensions, recompute_aggregate, recompute_entity_aggregate, EngagementAggregator,
};
pub use feed_resolver::FeedResolver;
