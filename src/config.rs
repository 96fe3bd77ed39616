use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub engagement: EngagementConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Limits applied by the engagement service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    pub feed_page_size: u32,
    pub forum_page_size: u32,
    pub comment_max_chars: usize,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            feed_page_size: 10,
            forum_page_size: 20,
            comment_max_chars: 5000,
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let defaults = EngagementConfig::default();
        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/engg_engagement.db?mode=rwc".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3000)?,
            },
            engagement: EngagementConfig {
                feed_page_size: parse_var("FEED_PAGE_SIZE", defaults.feed_page_size)?,
                forum_page_size: parse_var("FORUM_PAGE_SIZE", defaults.forum_page_size)?,
                comment_max_chars: parse_var("COMMENT_MAX_CHARS", defaults.comment_max_chars)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.engagement.feed_page_size == 0 {
            return Err(AppError::ConfigurationError(
                "FEED_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }
        if self.engagement.forum_page_size == 0 {
            return Err(AppError::ConfigurationError(
                "FORUM_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }
        if self.engagement.comment_max_chars == 0 {
            return Err(AppError::ConfigurationError(
                "COMMENT_MAX_CHARS must be greater than zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigurationError(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            engagement: EngagementConfig::default(),
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigurationError(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
