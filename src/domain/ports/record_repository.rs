use async_trait::async_trait;

use crate::domain::errors::CacheResult;
use crate::domain::models::{Author, Post};

/// Repository trait for the normalized record store.
///
/// Upsert-only: rows are created on first sight and merged afterwards,
/// overwriting a field only when the incoming value is present. No delete
/// operation is exposed; posts and authors outlive any individual cache
/// entry.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn upsert_author(&self, author: &Author) -> CacheResult<()>;

    /// Insert or merge a post. A save carrying a raw payload backfills a
    /// missing payload on the existing row even when every scalar field is
    /// absent.
    async fn upsert_post(&self, post: &Post) -> CacheResult<()>;

    async fn get_post(&self, id: &str) -> CacheResult<Option<Post>>;

    async fn get_author(&self, id: &str) -> CacheResult<Option<Author>>;
}
