//! Output rendering for cache reads.
//!
//! The reader resolves posts and authors from the store and hands them
//! here; rendering is pure. `min` emits the compact normalized subset with
//! null fields omitted, `max` replays the retained original payload.

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::models::{Author, Post};

/// Render a post in the compact `min` shape.
///
/// Fixed field subset; fields the store knows nothing about are omitted
/// entirely rather than emitted as null.
pub fn render_min(post: &Post, author: Option<&Author>) -> Value {
    let mut obj = Map::new();
    obj.insert("id".to_string(), Value::String(post.id.clone()));
    insert_string(&mut obj, "url", post.url.as_deref());
    insert_string(&mut obj, "text", post.text.as_deref());
    insert_string(&mut obj, "fullText", post.full_text.as_deref());
    if let Some(posted_at) = post.posted_at {
        obj.insert(
            "createdAt".to_string(),
            Value::String(posted_at.to_rfc3339()),
        );
    }
    insert_count(&mut obj, "repostCount", post.counts.reposts);
    insert_count(&mut obj, "replyCount", post.counts.replies);
    insert_count(&mut obj, "favoriteCount", post.counts.favorites);
    insert_count(&mut obj, "quoteCount", post.counts.quotes);
    insert_count(&mut obj, "viewCount", post.counts.views);
    if let Some(author) = author {
        obj.insert("author".to_string(), render_author(author));
    }
    Value::Object(obj)
}

/// Render a post in the `max` shape.
///
/// Replays the retained original payload when the row carries one. Rows
/// written before payload retention existed fall back to the normalized
/// reconstruction, so max-mode reads degrade gracefully instead of
/// returning nothing.
pub fn render_max(post: &Post, author: Option<&Author>) -> Value {
    if let Some(raw) = &post.raw_payload {
        match serde_json::from_str(raw) {
            Ok(value) => return value,
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "stored raw payload is not valid JSON, reconstructing");
            }
        }
    }
    render_min(post, author)
}

fn render_author(author: &Author) -> Value {
    let mut obj = Map::new();
    obj.insert("id".to_string(), Value::String(author.id.clone()));
    insert_string(&mut obj, "userName", author.username.as_deref());
    insert_string(&mut obj, "name", author.display_name.as_deref());
    insert_string(&mut obj, "url", author.profile_url.as_deref());
    Value::Object(obj)
}

fn insert_string(obj: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        obj.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn insert_count(obj: &mut Map<String, Value>, key: &str, value: Option<i64>) {
    if let Some(value) = value {
        obj.insert(key.to_string(), Value::Number(value.into()));
    }
}
