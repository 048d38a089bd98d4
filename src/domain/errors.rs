//! Domain errors for the feedcache store.

use thiserror::Error;

/// Errors surfaced by cache and record store operations.
///
/// Expired or absent cache entries are not errors; they are modeled as a
/// clean miss (`Ok(None)`) by the reader.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown payload mode: {0}")]
    UnknownPayloadMode(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
