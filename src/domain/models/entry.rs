//! Cache entry and item models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached query result set, keyed by the query fingerprint.
///
/// One row per fingerprint. Re-saving the same fingerprint overwrites
/// `item_count`, `expires_at`, and `dataset_id` and fully replaces the
/// linked items; entries are never versioned or appended to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Deterministic hash of (query type, parameters); primary key.
    pub fingerprint: String,
    pub query_type: String,
    /// Original parameter mapping, stored opaquely for observability.
    pub params: Value,
    /// Upstream dataset/run id of the fetch that produced the entry.
    pub dataset_id: Option<String>,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is stale relative to `now`.
    ///
    /// Expired entries read as misses but stay on disk until the next save
    /// of the same fingerprint replaces them.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Join row linking a cache entry to a post at an explicit position.
///
/// Result ordering lives only here; nothing on the post itself implies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheItem {
    pub fingerprint: String,
    pub post_id: String,
    pub idx: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let entry = CacheEntry {
            fingerprint: "f".into(),
            query_type: "topic".into(),
            params: Value::Null,
            dataset_id: None,
            item_count: 0,
            created_at: now,
            expires_at: now,
        };
        // Strictly past, not merely reached.
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::seconds(1)));
    }
}
