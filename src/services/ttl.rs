//! Cache lifetime policy.

use crate::domain::models::TtlConfig;

/// Sort order value that marks a topic query as ranked rather than
/// recency-sensitive.
const RANKED_SORT: &str = "top";

/// Pure lookup of cache lifetime by query type and sort order.
///
/// Built once from [`TtlConfig`] at startup. Ranked topic results are
/// stable over hours; recency-sorted ones churn within minutes, so they
/// get a much shorter lifetime.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    topic_ranked: i64,
    topic_latest: i64,
    profile: i64,
    replies: i64,
    fallback: i64,
}

impl TtlPolicy {
    pub fn new(config: &TtlConfig) -> Self {
        Self {
            topic_ranked: config.topic_ranked_secs,
            topic_latest: config.topic_latest_secs,
            profile: config.profile_secs,
            replies: config.replies_secs,
            fallback: config.default_secs,
        }
    }

    /// Lifetime in seconds for a query of `query_type` sorted by `sort`.
    ///
    /// Unrecognized query types fall back to the default lifetime.
    pub fn ttl_seconds(&self, query_type: &str, sort: Option<&str>) -> i64 {
        match query_type {
            "topic" => {
                if sort.is_some_and(|s| s.eq_ignore_ascii_case(RANKED_SORT)) {
                    self.topic_ranked
                } else {
                    self.topic_latest
                }
            }
            "profile" => self.profile,
            "replies" => self.replies,
            _ => self.fallback,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(&TtlConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_topic_outlives_latest() {
        let policy = TtlPolicy::default();
        let ranked = policy.ttl_seconds("topic", Some("Top"));
        let latest = policy.ttl_seconds("topic", Some("Latest"));
        assert!(ranked > latest);
    }

    #[test]
    fn test_topic_without_sort_is_recency_sensitive() {
        let policy = TtlPolicy::default();
        assert_eq!(
            policy.ttl_seconds("topic", None),
            policy.ttl_seconds("topic", Some("Latest"))
        );
    }

    #[test]
    fn test_ranked_sort_is_case_insensitive() {
        let policy = TtlPolicy::default();
        assert_eq!(
            policy.ttl_seconds("topic", Some("TOP")),
            policy.ttl_seconds("topic", Some("Top"))
        );
    }

    #[test]
    fn test_unrecognized_type_uses_fallback() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.ttl_seconds("trending", None), 1_800);
    }

    #[test]
    fn test_configured_values_are_honored() {
        let config = TtlConfig {
            topic_ranked_secs: 100,
            topic_latest_secs: 10,
            profile_secs: 20,
            replies_secs: 30,
            default_secs: 40,
        };
        let policy = TtlPolicy::new(&config);
        assert_eq!(policy.ttl_seconds("topic", Some("Top")), 100);
        assert_eq!(policy.ttl_seconds("topic", Some("Latest")), 10);
        assert_eq!(policy.ttl_seconds("profile", None), 20);
        assert_eq!(policy.ttl_seconds("replies", None), 30);
        assert_eq!(policy.ttl_seconds("anything", None), 40);
    }
}
