use serde::{Deserialize, Serialize};

/// Main configuration structure for the feed cache.
///
/// Loaded once at process startup and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cache lifetime table
    #[serde(default)]
    pub ttl: TtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            ttl: TtlConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// `SQLite` connection string
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite:.feedcache/feedcache.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Cache lifetime table, in seconds, keyed by query type and sort order.
///
/// Ranked topic results age far slower than recency-sorted ones, so the
/// two get separate knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TtlConfig {
    /// Topic queries sorted by rank/aggregate relevance
    #[serde(default = "default_topic_ranked_secs")]
    pub topic_ranked_secs: i64,

    /// Topic queries sorted by recency
    #[serde(default = "default_topic_latest_secs")]
    pub topic_latest_secs: i64,

    /// Author profile timelines
    #[serde(default = "default_profile_secs")]
    pub profile_secs: i64,

    /// Reply threads
    #[serde(default = "default_replies_secs")]
    pub replies_secs: i64,

    /// Fallback for unrecognized query types
    #[serde(default = "default_default_secs")]
    pub default_secs: i64,
}

const fn default_topic_ranked_secs() -> i64 {
    21_600
}

const fn default_topic_latest_secs() -> i64 {
    900
}

const fn default_profile_secs() -> i64 {
    3_600
}

const fn default_replies_secs() -> i64 {
    1_800
}

const fn default_default_secs() -> i64 {
    1_800
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            topic_ranked_secs: default_topic_ranked_secs(),
            topic_latest_secs: default_topic_latest_secs(),
            profile_secs: default_profile_secs(),
            replies_secs: default_replies_secs(),
            default_secs: default_default_secs(),
        }
    }
}
