//! SQLite implementation of the query cache.
//!
//! One table row per query fingerprint, join rows carrying result order,
//! posts and authors shared with every other entry that surfaces them.
//! Saves are a single transaction; readers see either the previous item
//! set or the new one, never a half-written mix.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::adapters::sqlite::record_repository;
use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::models::{CacheEntry, PayloadMode};
use crate::domain::ports::CacheRepository;
use crate::services::normalizer::normalize_record;
use crate::services::render::{render_max, render_min};
use crate::services::ttl::TtlPolicy;

/// Pooled cache store handle.
///
/// Constructed by the host with an initialized pool and the TTL table;
/// there is no ambient global instance.
#[derive(Clone)]
pub struct SqliteCacheRepository {
    pool: SqlitePool,
    ttl: TtlPolicy,
}

impl SqliteCacheRepository {
    pub fn new(pool: SqlitePool, ttl: TtlPolicy) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl CacheRepository for SqliteCacheRepository {
    async fn save(
        &self,
        fingerprint: &str,
        query_type: &str,
        params: &Map<String, Value>,
        items: &[Value],
        dataset_id: Option<&str>,
        mode: PayloadMode,
    ) -> CacheResult<CacheEntry> {
        let now = Utc::now();
        let sort = params.get("sort").and_then(Value::as_str);
        let ttl = self.ttl.ttl_seconds(query_type, sort);
        let expires_at = now + Duration::seconds(ttl);
        let params_json = Value::Object(params.clone()).to_string();

        let mut tx = self.pool.begin().await?;

        // Entry upsert keeps the original created_at; a re-save replaces
        // everything else about the entry.
        sqlx::query(
            r#"INSERT INTO cache_entries (fingerprint, query_type, params, dataset_id, item_count, created_at, expires_at)
               VALUES (?, ?, ?, ?, 0, ?, ?)
               ON CONFLICT(fingerprint) DO UPDATE SET
                   query_type = excluded.query_type,
                   params = excluded.params,
                   dataset_id = excluded.dataset_id,
                   item_count = excluded.item_count,
                   expires_at = excluded.expires_at"#,
        )
        .bind(fingerprint)
        .bind(query_type)
        .bind(&params_json)
        .bind(dataset_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // No append semantics: the previous item set goes away wholesale.
        sqlx::query("DELETE FROM cache_items WHERE fingerprint = ?")
            .bind(fingerprint)
            .execute(&mut *tx)
            .await?;

        let mut item_count = 0i64;
        let mut seen: HashSet<String> = HashSet::new();
        for (position, item) in items.iter().enumerate() {
            let Some(normalized) = normalize_record(item, mode, now) else {
                warn!(fingerprint, position, "record without identity skipped");
                continue;
            };
            if !seen.insert(normalized.post.id.clone()) {
                debug!(fingerprint, post_id = %normalized.post.id, "duplicate post id in batch skipped");
                continue;
            }

            if let Some(author) = &normalized.author {
                record_repository::upsert_author(&mut *tx, author).await?;
            }
            record_repository::upsert_post(&mut *tx, &normalized.post).await?;

            sqlx::query("INSERT INTO cache_items (fingerprint, post_id, idx) VALUES (?, ?, ?)")
                .bind(fingerprint)
                .bind(&normalized.post.id)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
            item_count += 1;
        }

        sqlx::query("UPDATE cache_entries SET item_count = ? WHERE fingerprint = ?")
            .bind(item_count)
            .bind(fingerprint)
            .execute(&mut *tx)
            .await?;

        let entry = fetch_entry(&mut *tx, fingerprint)
            .await?
            .ok_or_else(|| CacheError::Database("cache entry vanished mid-save".to_string()))?;

        tx.commit().await?;

        debug!(fingerprint, query_type, item_count, "cache entry saved");
        Ok(entry)
    }

    async fn get(&self, fingerprint: &str, mode: PayloadMode) -> CacheResult<Option<Vec<Value>>> {
        let mut conn = self.pool.acquire().await?;

        let Some(entry) = fetch_entry(&mut *conn, fingerprint).await? else {
            debug!(fingerprint, "cache miss");
            return Ok(None);
        };
        if entry.is_expired(Utc::now()) {
            // Indistinguishable from a miss; the row stays until the next
            // save of this fingerprint replaces it.
            debug!(fingerprint, "cache entry expired");
            return Ok(None);
        }

        let item_rows: Vec<(String,)> = sqlx::query_as(
            "SELECT post_id FROM cache_items WHERE fingerprint = ? ORDER BY idx",
        )
        .bind(fingerprint)
        .fetch_all(&mut *conn)
        .await?;

        let mut rendered = Vec::with_capacity(item_rows.len());
        for (post_id,) in item_rows {
            let Some(post) = record_repository::fetch_post(&mut *conn, &post_id).await? else {
                warn!(fingerprint, post_id = %post_id, "cache item references missing post, skipping");
                continue;
            };
            let author = match post.author_id.as_deref() {
                Some(author_id) => record_repository::fetch_author(&mut *conn, author_id).await?,
                None => None,
            };
            rendered.push(match mode {
                PayloadMode::Min => render_min(&post, author.as_ref()),
                PayloadMode::Max => render_max(&post, author.as_ref()),
            });
        }

        debug!(fingerprint, items = rendered.len(), "cache hit");
        Ok(Some(rendered))
    }

    async fn entry(&self, fingerprint: &str) -> CacheResult<Option<CacheEntry>> {
        let mut conn = self.pool.acquire().await?;
        fetch_entry(&mut *conn, fingerprint).await
    }
}

async fn fetch_entry(
    conn: &mut SqliteConnection,
    fingerprint: &str,
) -> CacheResult<Option<CacheEntry>> {
    let row: Option<EntryRow> = sqlx::query_as("SELECT * FROM cache_entries WHERE fingerprint = ?")
        .bind(fingerprint)
        .fetch_optional(conn)
        .await?;

    row.map(TryInto::try_into).transpose()
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    fingerprint: String,
    query_type: String,
    params: String,
    dataset_id: Option<String>,
    item_count: i64,
    created_at: String,
    expires_at: String,
}

impl TryFrom<EntryRow> for CacheEntry {
    type Error = CacheError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(CacheEntry {
            fingerprint: row.fingerprint,
            query_type: row.query_type,
            params: serde_json::from_str(&row.params)?,
            dataset_id: row.dataset_id,
            item_count: row.item_count,
            created_at: super::parse_datetime(&row.created_at)?,
            expires_at: super::parse_datetime(&row.expires_at)?,
        })
    }
}
