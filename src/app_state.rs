use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{EngagementStore, SqliteDatabase},
    services::{EngagementAggregator, FeedResolver},
};

#[derive(Clone)]
pub struct AppState {
    pub database: Arc<SqliteDatabase>,
    pub aggregator: EngagementAggregator,
    pub feed: FeedResolver,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database =
            SqliteDatabase::connect(&config.database.url, config.database.max_connections).await?;
        Ok(Self::with_database(Arc::new(database), config))
    }

    /// Wire the services around an already opened database
    pub fn with_database(database: Arc<SqliteDatabase>, config: Config) -> Self {
        let store: Arc<dyn EngagementStore> = database.clone();
        Self {
            aggregator: EngagementAggregator::new(store.clone(), config.engagement.clone()),
            feed: FeedResolver::new(
                store,
                config.engagement.feed_page_size,
                config.engagement.forum_page_size,
            ),
            database,
            config,
        }
    }
}
