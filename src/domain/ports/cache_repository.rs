use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::CacheResult;
use crate::domain::models::{CacheEntry, PayloadMode};

/// Repository trait for the content-addressed query cache.
///
/// Callers compute a fingerprint with
/// [`query_fingerprint`](crate::services::query_fingerprint), try [`get`],
/// and on a miss perform the upstream fetch and [`save`] the result.
///
/// [`get`]: CacheRepository::get
/// [`save`]: CacheRepository::save
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Atomically store a fresh fetch under `fingerprint`.
    ///
    /// Replaces any previous item set for the fingerprint, upserts the
    /// normalized authors and posts the items surface, and stamps a new
    /// expiry from the TTL table. Items without an identity field are
    /// skipped with a warning rather than failing the batch.
    ///
    /// # Arguments
    /// * `fingerprint` - Deterministic query hash, the entry's identity
    /// * `query_type` - Logical query kind (e.g. `topic`, `profile`)
    /// * `params` - Original parameter mapping, stored opaquely
    /// * `items` - Ordered result records from the upstream fetch
    /// * `dataset_id` - Upstream dataset/run id, when the backend reports one
    /// * `mode` - Payload retention mode for the saved posts
    ///
    /// # Errors
    /// Returns an error if the storage layer fails; the whole save rolls
    /// back and the caller must retry the entire upstream fetch.
    async fn save(
        &self,
        fingerprint: &str,
        query_type: &str,
        params: &Map<String, Value>,
        items: &[Value],
        dataset_id: Option<&str>,
        mode: PayloadMode,
    ) -> CacheResult<CacheEntry>;

    /// Resolve a fingerprint to its rendered items.
    ///
    /// Returns `None` when the entry is absent or its TTL has elapsed; the
    /// two cases are indistinguishable to callers. Items are returned in
    /// their saved order, rendered per `mode`.
    async fn get(&self, fingerprint: &str, mode: PayloadMode) -> CacheResult<Option<Vec<Value>>>;

    /// Look up the stored entry row regardless of expiry.
    ///
    /// Expired entries persist until the next save replaces them; this
    /// exposes them for observability.
    async fn entry(&self, fingerprint: &str) -> CacheResult<Option<CacheEntry>>;
}
