//! Post domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output serialization mode for cached records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadMode {
    /// Compact normalized field subset.
    Min,
    /// Full original payload, retained for lossless re-serialization.
    Max,
}

impl Default for PayloadMode {
    fn default() -> Self {
        Self::Min
    }
}

impl PayloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }
}

/// Engagement counters reported by the upstream source.
///
/// Counters are best-effort snapshots; the source does not guarantee they
/// grow monotonically between scrapes, so no ordering is enforced here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub reposts: Option<i64>,
    pub replies: Option<i64>,
    pub favorites: Option<i64>,
    pub quotes: Option<i64>,
    pub views: Option<i64>,
}

/// A scraped feed post.
///
/// Identity is the upstream id, globally unique across queries. A post is
/// stored exactly once no matter how many cached queries surface it; saves
/// merge into the existing row without erasing previously known values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Globally unique upstream identifier.
    pub id: String,
    pub url: Option<String>,
    /// Short display text.
    pub text: Option<String>,
    /// Untruncated text, when the source provides one.
    pub full_text: Option<String>,
    /// Weak reference to the post's author; null when the source omitted
    /// author data or the author row was removed.
    pub author_id: Option<String>,
    pub counts: EngagementCounts,
    /// Publication time as reported upstream; null when unparseable.
    pub posted_at: Option<DateTime<Utc>>,
    /// When this post was last written by a save.
    pub scraped_at: DateTime<Utc>,
    /// Serialization mode the row was captured under.
    pub payload_mode: PayloadMode,
    /// Full original record JSON; present only after a max-mode save.
    pub raw_payload: Option<String>,
}

impl Post {
    /// Create a minimal post known only by its upstream id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
            text: None,
            full_text: None,
            author_id: None,
            counts: EngagementCounts::default(),
            posted_at: None,
            scraped_at: Utc::now(),
            payload_mode: PayloadMode::Min,
            raw_payload: None,
        }
    }
}
