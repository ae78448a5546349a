//! Persistence layer modules.

pub mod book_repo;
pub mod chat_repo;
pub mod db;
pub mod drill_repo;
pub mod journal_repo;
pub mod rule_repo;
pub mod schema;
pub mod sweeper;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
