//! SQLite implementation of the normalized record store.
//!
//! Upsert-only. Merges follow one rule: an incoming field overwrites only
//! when it is non-null, so repeated scrapes accumulate information and
//! never erase it. The exception works in the same direction: a save that
//! carries a raw payload backfills a row that lacks one, and a later save
//! without a payload leaves the retained one in place.
//!
//! The SQL bodies are free functions over `&mut SqliteConnection` so the
//! cache writer can run them inside its own transaction; the pooled
//! [`SqliteRecordRepository`] wraps the same functions for standalone use.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::models::{Author, EngagementCounts, PayloadMode, Post};
use crate::domain::ports::RecordRepository;

pub(crate) async fn upsert_author(conn: &mut SqliteConnection, author: &Author) -> CacheResult<()> {
    sqlx::query(
        r#"INSERT INTO authors (id, username, display_name, profile_url, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)
           ON CONFLICT(id) DO UPDATE SET
               username = COALESCE(excluded.username, authors.username),
               display_name = COALESCE(excluded.display_name, authors.display_name),
               profile_url = COALESCE(excluded.profile_url, authors.profile_url),
               updated_at = excluded.updated_at"#,
    )
    .bind(&author.id)
    .bind(&author.username)
    .bind(&author.display_name)
    .bind(&author.profile_url)
    .bind(author.created_at.to_rfc3339())
    .bind(author.updated_at.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn upsert_post(conn: &mut SqliteConnection, post: &Post) -> CacheResult<()> {
    sqlx::query(
        r#"INSERT INTO posts (id, url, text, full_text, author_id, repost_count, reply_count,
                              favorite_count, quote_count, view_count, posted_at, scraped_at,
                              payload_mode, raw_payload)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(id) DO UPDATE SET
               url = COALESCE(excluded.url, posts.url),
               text = COALESCE(excluded.text, posts.text),
               full_text = COALESCE(excluded.full_text, posts.full_text),
               author_id = COALESCE(excluded.author_id, posts.author_id),
               repost_count = COALESCE(excluded.repost_count, posts.repost_count),
               reply_count = COALESCE(excluded.reply_count, posts.reply_count),
               favorite_count = COALESCE(excluded.favorite_count, posts.favorite_count),
               quote_count = COALESCE(excluded.quote_count, posts.quote_count),
               view_count = COALESCE(excluded.view_count, posts.view_count),
               posted_at = COALESCE(excluded.posted_at, posts.posted_at),
               scraped_at = excluded.scraped_at,
               raw_payload = COALESCE(excluded.raw_payload, posts.raw_payload),
               payload_mode = CASE
                   WHEN excluded.raw_payload IS NOT NULL THEN excluded.payload_mode
                   ELSE posts.payload_mode
               END"#,
    )
    .bind(&post.id)
    .bind(&post.url)
    .bind(&post.text)
    .bind(&post.full_text)
    .bind(&post.author_id)
    .bind(post.counts.reposts)
    .bind(post.counts.replies)
    .bind(post.counts.favorites)
    .bind(post.counts.quotes)
    .bind(post.counts.views)
    .bind(post.posted_at.map(|t| t.to_rfc3339()))
    .bind(post.scraped_at.to_rfc3339())
    .bind(post.payload_mode.as_str())
    .bind(&post.raw_payload)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_post(conn: &mut SqliteConnection, id: &str) -> CacheResult<Option<Post>> {
    let row: Option<PostRow> = sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    row.map(TryInto::try_into).transpose()
}

pub(crate) async fn fetch_author(conn: &mut SqliteConnection, id: &str) -> CacheResult<Option<Author>> {
    let row: Option<AuthorRow> = sqlx::query_as("SELECT * FROM authors WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    row.map(TryInto::try_into).transpose()
}

/// Pooled record store handle.
#[derive(Clone)]
pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn upsert_author(&self, author: &Author) -> CacheResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_author(&mut *conn, author).await
    }

    async fn upsert_post(&self, post: &Post) -> CacheResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_post(&mut *conn, post).await
    }

    async fn get_post(&self, id: &str) -> CacheResult<Option<Post>> {
        let mut conn = self.pool.acquire().await?;
        fetch_post(&mut *conn, id).await
    }

    async fn get_author(&self, id: &str) -> CacheResult<Option<Author>> {
        let mut conn = self.pool.acquire().await?;
        fetch_author(&mut *conn, id).await
    }
}

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: String,
    username: Option<String>,
    display_name: Option<String>,
    profile_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AuthorRow> for Author {
    type Error = CacheError;

    fn try_from(row: AuthorRow) -> Result<Self, Self::Error> {
        Ok(Author {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            profile_url: row.profile_url,
            created_at: super::parse_datetime(&row.created_at)?,
            updated_at: super::parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    url: Option<String>,
    text: Option<String>,
    full_text: Option<String>,
    author_id: Option<String>,
    repost_count: Option<i64>,
    reply_count: Option<i64>,
    favorite_count: Option<i64>,
    quote_count: Option<i64>,
    view_count: Option<i64>,
    posted_at: Option<String>,
    scraped_at: String,
    payload_mode: String,
    raw_payload: Option<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = CacheError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let payload_mode = PayloadMode::from_str(&row.payload_mode)
            .ok_or_else(|| CacheError::UnknownPayloadMode(row.payload_mode.clone()))?;

        Ok(Post {
            id: row.id,
            url: row.url,
            text: row.text,
            full_text: row.full_text,
            author_id: row.author_id,
            counts: EngagementCounts {
                reposts: row.repost_count,
                replies: row.reply_count,
                favorites: row.favorite_count,
                quotes: row.quote_count,
                views: row.view_count,
            },
            posted_at: super::parse_optional_datetime(row.posted_at)?,
            scraped_at: super::parse_datetime(&row.scraped_at)?,
            payload_mode,
            raw_payload: row.raw_payload,
        })
    }
}
