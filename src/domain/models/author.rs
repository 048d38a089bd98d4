//! Author domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed author, owned independently of any query and shared across posts.
///
/// Identity is the upstream id. Rows are created on first sight and merged
/// non-destructively afterwards: a field is refreshed only when the incoming
/// value is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Stable upstream identifier.
    pub id: String,
    /// Handle, e.g. `alice`.
    pub username: Option<String>,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Canonical profile URL.
    pub profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    /// Create an author known only by its upstream id.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            username: None,
            display_name: None,
            profile_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}
