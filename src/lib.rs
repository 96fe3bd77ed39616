// engg.pk engagement service - likes, follows, comments, reviews and the subscription feed

// Core types and primitives
pub mod core;

// Domain records
pub mod models;

// Persistence and request plumbing
pub mod infrastructure;

// Aggregator, feed resolver and input validation
pub mod services;

// HTTP layer
pub mod app_state;
pub mod routes;

// Common utilities
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
