//! SQLite database adapters for the feed cache.

pub mod cache_repository;
pub mod connection;
pub mod migrations;
pub mod record_repository;

pub use cache_repository::SqliteCacheRepository;
pub use connection::{
    connect_with_retry, create_pool, create_test_pool, verify_connection, ConnectionError,
    PoolConfig,
};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use record_repository::SqliteRecordRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{CacheError, CacheResult};

/// Parse an RFC3339 datetime string from a SQLite row field.
pub(crate) fn parse_datetime(s: &str) -> CacheResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| CacheError::Serialization(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an optional RFC3339 datetime string from a SQLite row field.
pub(crate) fn parse_optional_datetime(s: Option<String>) -> CacheResult<Option<DateTime<Utc>>> {
    s.map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Connect (with startup backoff) and bring the schema up to date.
///
/// This is the one-stop entry point for host processes: the returned pool
/// is what `SqliteCacheRepository` and `SqliteRecordRepository` take.
pub async fn initialize_database(
    database_url: &str,
    config: Option<PoolConfig>,
) -> Result<SqlitePool, DatabaseError> {
    let pool = connect_with_retry(database_url, config).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
