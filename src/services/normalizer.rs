//! Record normalization.
//!
//! Maps one opaque upstream record into the canonical author and post
//! entities the store persists. Normalization is lenient everywhere except
//! identity: a record without an id cannot be deduplicated and is rejected,
//! while every other malformed field degrades to null.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::domain::models::{Author, EngagementCounts, PayloadMode, Post};

/// Legacy fixed-width timestamp shape, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const LEGACY_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// One record mapped into canonical entities, ready for the store.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    /// The post's author, when the record carried identifiable author data.
    pub author: Option<Author>,
    pub post: Post,
}

/// Normalize one upstream record.
///
/// Returns `None` when the record lacks an identity field; the caller is
/// expected to skip it and log, not fail the batch. Author data missing its
/// own id is treated as "no author"; linkage is best-effort.
///
/// In [`PayloadMode::Max`] the full original record is retained alongside
/// the normalized fields so reads can re-serialize it losslessly.
pub fn normalize_record(
    record: &Value,
    mode: PayloadMode,
    scraped_at: DateTime<Utc>,
) -> Option<NormalizedRecord> {
    let id = identity(record.get("id"))?;

    let author = record
        .get("author")
        .and_then(|value| normalize_author(value, scraped_at));

    let raw_payload = match mode {
        PayloadMode::Max => Some(record.to_string()),
        PayloadMode::Min => None,
    };

    let post = Post {
        id,
        url: string_field(record.get("url")),
        text: string_field(record.get("text")),
        full_text: string_field(record.get("fullText")),
        author_id: author.as_ref().map(|a| a.id.clone()),
        counts: EngagementCounts {
            reposts: count_field(record.get("repostCount")),
            replies: count_field(record.get("replyCount")),
            favorites: count_field(record.get("favoriteCount")),
            quotes: count_field(record.get("quoteCount")),
            views: count_field(record.get("viewCount")),
        },
        posted_at: record
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_post_timestamp),
        scraped_at,
        payload_mode: mode,
        raw_payload,
    };

    Some(NormalizedRecord { author, post })
}

fn normalize_author(value: &Value, now: DateTime<Utc>) -> Option<Author> {
    let id = identity(value.get("id"))?;
    Some(Author {
        id,
        username: string_field(value.get("userName")),
        display_name: string_field(value.get("name")),
        profile_url: string_field(value.get("url")),
        created_at: now,
        updated_at: now,
    })
}

/// Parse an upstream timestamp string.
///
/// The source emits two shapes: ISO-8601 with `Z` or an explicit offset,
/// and the legacy fixed-width form. Anything else is logged and nulled;
/// an unparseable timestamp never blocks caching the record.
pub fn parse_post_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    match DateTime::parse_from_str(s, LEGACY_TIMESTAMP_FORMAT) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(_) => {
            warn!(timestamp = %s, "unparseable post timestamp, storing null");
            None
        }
    }
}

/// Extract a record identity: a non-empty string, or a number rendered as
/// its decimal form (some backends emit numeric ids).
fn identity(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn count_field(value: Option<&Value>) -> Option<i64> {
    value.and_then(Value::as_i64)
}
