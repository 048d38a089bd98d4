//! Feedcache - Query Cache for Social-Feed Scraping Tools
//!
//! Feedcache turns repeated, expensive, metered harvesting calls into a
//! deterministic, TTL-bounded, deduplicated store. A logical query is
//! content-addressed by a fingerprint of its type and parameters; its
//! results are normalized into shared post/author rows and linked back to
//! the query in order.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and errors
//! - **Service Layer** (`services`): Pure logic: fingerprinting, TTL
//!   policy, record normalization, output rendering
//! - **Adapter Layer** (`adapters`): SQLite storage implementations
//! - **Infrastructure Layer** (`infrastructure`): Configuration loading
//!
//! # Example
//!
//! ```ignore
//! use feedcache::adapters::sqlite::{initialize_database, SqliteCacheRepository};
//! use feedcache::domain::ports::CacheRepository;
//! use feedcache::services::{query_fingerprint, TtlPolicy};
//!
//! # async fn example(params: serde_json::Map<String, serde_json::Value>,
//! #                  items: Vec<serde_json::Value>) -> anyhow::Result<()> {
//! let pool = initialize_database("sqlite:.feedcache/feedcache.db", None).await?;
//! let cache = SqliteCacheRepository::new(pool, TtlPolicy::default());
//!
//! let fingerprint = query_fingerprint("topic", &params);
//! if cache.get(&fingerprint, feedcache::domain::models::PayloadMode::Min).await?.is_none() {
//!     // ... perform the upstream fetch, then:
//!     cache.save(&fingerprint, "topic", &params, &items, None,
//!                feedcache::domain::models::PayloadMode::Min).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::sqlite::{
    initialize_database, SqliteCacheRepository, SqliteRecordRepository,
};
pub use domain::errors::{CacheError, CacheResult};
pub use domain::models::{
    Author, CacheConfig, CacheEntry, CacheItem, DatabaseConfig, EngagementCounts, PayloadMode,
    Post, TtlConfig,
};
pub use domain::ports::{CacheRepository, RecordRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{query_fingerprint, TtlPolicy};
