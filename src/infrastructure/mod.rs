// Infrastructure: persistence and request plumbing
pub mod database;         // Store interface
pub mod extract;          // JSON-rejecting extractors
pub mod sqlite_database;  // SQLite implementation
pub mod viewer;           // Viewer extractor

pub use database::EngagementStore;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use sqlite_database::SqliteDatabase;
pub use viewer::{Viewer, VIEWER_HEADER};
