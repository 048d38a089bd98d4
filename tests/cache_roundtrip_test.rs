use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;

use feedcache::adapters::sqlite::create_migrated_test_pool;
use feedcache::domain::ports::CacheRepository;
use feedcache::services::TtlPolicy;
use feedcache::{PayloadMode, SqliteCacheRepository};

async fn setup() -> (SqliteCacheRepository, SqlitePool) {
    // Surface warn-level skips (identityless records, dangling items) when
    // a test run is inspected with RUST_LOG set.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test database");
    let repo = SqliteCacheRepository::new(pool.clone(), TtlPolicy::default());
    (repo, pool)
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count query failed");
    n
}

#[tokio::test]
async fn test_round_trip_preserves_order_and_identity() {
    let (repo, _pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));
    let items = vec![
        json!({"id": "p1", "text": "first"}),
        json!({"id": "p2", "text": "second"}),
    ];

    repo.save("f1", "topic", &p, &items, None, PayloadMode::Min)
        .await
        .expect("save failed");

    let got = repo
        .get("f1", PayloadMode::Min)
        .await
        .expect("get failed")
        .expect("expected a hit");

    assert_eq!(got.len(), 2);
    assert_eq!(got[0].get("id"), Some(&json!("p1")));
    assert_eq!(got[1].get("id"), Some(&json!("p2")));
}

#[tokio::test]
async fn test_resave_is_idempotent() {
    let (repo, pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));
    let items = vec![
        json!({"id": "p1", "text": "hello", "author": {"id": "a1", "userName": "alice"}}),
        json!({"id": "p2", "text": "world", "author": {"id": "a1", "userName": "alice"}}),
    ];

    repo.save("f1", "topic", &p, &items, None, PayloadMode::Min)
        .await
        .expect("first save failed");
    let first = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();

    repo.save("f1", "topic", &p, &items, None, PayloadMode::Min)
        .await
        .expect("second save failed");
    let second = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(count(&pool, "posts").await, 2);
    assert_eq!(count(&pool, "authors").await, 1);
    assert_eq!(count(&pool, "cache_items").await, 2);
}

#[tokio::test]
async fn test_resave_replaces_item_set() {
    let (repo, pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));

    repo.save(
        "f1",
        "topic",
        &p,
        &[json!({"id": "p1"}), json!({"id": "p2"})],
        None,
        PayloadMode::Min,
    )
    .await
    .expect("first save failed");

    repo.save("f1", "topic", &p, &[json!({"id": "p3"})], None, PayloadMode::Min)
        .await
        .expect("second save failed");

    let got = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].get("id"), Some(&json!("p3")));

    // The prior two links are gone; the posts themselves survive.
    assert_eq!(count(&pool, "cache_items").await, 1);
    assert_eq!(count(&pool, "posts").await, 3);
}

#[tokio::test]
async fn test_expired_entry_reads_as_miss_but_row_persists() {
    let (repo, pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));

    repo.save("f1", "topic", &p, &[json!({"id": "p1"})], None, PayloadMode::Min)
        .await
        .expect("save failed");

    let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
    sqlx::query("UPDATE cache_entries SET expires_at = ? WHERE fingerprint = ?")
        .bind(&past)
        .bind("f1")
        .execute(&pool)
        .await
        .expect("failed to age entry");

    assert!(repo.get("f1", PayloadMode::Min).await.unwrap().is_none());

    // Lazy expiry: the row is still there for the next save to replace.
    let entry = repo.entry("f1").await.unwrap().expect("entry row missing");
    assert!(entry.is_expired(Utc::now()));
    assert_eq!(count(&pool, "cache_entries").await, 1);
}

#[tokio::test]
async fn test_resave_refreshes_expired_entry() {
    let (repo, pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));

    repo.save("f1", "topic", &p, &[json!({"id": "p1"})], None, PayloadMode::Min)
        .await
        .unwrap();

    let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
    sqlx::query("UPDATE cache_entries SET expires_at = ? WHERE fingerprint = ?")
        .bind(&past)
        .bind("f1")
        .execute(&pool)
        .await
        .unwrap();
    assert!(repo.get("f1", PayloadMode::Min).await.unwrap().is_none());

    repo.save("f1", "topic", &p, &[json!({"id": "p1"})], None, PayloadMode::Min)
        .await
        .unwrap();
    assert!(repo.get("f1", PayloadMode::Min).await.unwrap().is_some());
}

#[tokio::test]
async fn test_shared_post_is_stored_once() {
    let (repo, pool) = setup().await;
    let shared = json!({"id": "p1", "text": "seen twice"});

    repo.save(
        "f1",
        "topic",
        &params(json!({"searchTerms": ["a"]})),
        &[shared.clone()],
        None,
        PayloadMode::Min,
    )
    .await
    .unwrap();

    repo.save(
        "f2",
        "profile",
        &params(json!({"handle": "alice"})),
        &[shared],
        None,
        PayloadMode::Min,
    )
    .await
    .unwrap();

    assert_eq!(count(&pool, "posts").await, 1);
    assert_eq!(count(&pool, "cache_items").await, 2);

    let from_topic = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();
    let from_profile = repo.get("f2", PayloadMode::Min).await.unwrap().unwrap();
    assert_eq!(from_topic[0].get("id"), from_profile[0].get("id"));
}

#[tokio::test]
async fn test_max_read_of_min_saved_entry_reconstructs() {
    let (repo, _pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));
    let items = vec![json!({
        "id": "p1",
        "text": "hello",
        "author": {"id": "a1", "userName": "alice"}
    })];

    repo.save("f1", "topic", &p, &items, None, PayloadMode::Min)
        .await
        .unwrap();

    // Saved without payload retention; a max read still yields the
    // normalized fields rather than nothing.
    let got = repo.get("f1", PayloadMode::Max).await.unwrap().unwrap();
    assert_eq!(got[0].get("id"), Some(&json!("p1")));
    assert_eq!(got[0].get("text"), Some(&json!("hello")));
    assert_eq!(
        got[0].get("author").and_then(|a| a.get("userName")),
        Some(&json!("alice"))
    );
}

#[tokio::test]
async fn test_max_save_replays_original_payload() {
    let (repo, _pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));
    let original = json!({
        "id": "p1",
        "text": "hello",
        "somethingTheSchemaNeverHeardOf": {"deep": [1, 2, 3]}
    });

    repo.save("f1", "topic", &p, &[original.clone()], None, PayloadMode::Max)
        .await
        .unwrap();

    let got = repo.get("f1", PayloadMode::Max).await.unwrap().unwrap();
    assert_eq!(got[0], original);
}

#[tokio::test]
async fn test_minimal_topic_lookup_round_trip() {
    let (repo, _pool) = setup().await;
    let p = params(json!({"searchTerms": ["a"]}));
    let items = vec![json!({
        "id": "p1",
        "text": "hello",
        "author": {"id": "a1", "userName": "alice"}
    })];

    repo.save("k1", "topic", &p, &items, None, PayloadMode::Min)
        .await
        .expect("save failed");

    let got = repo
        .get("k1", PayloadMode::Min)
        .await
        .expect("get failed")
        .expect("expected a hit");

    assert_eq!(
        got,
        vec![json!({
            "id": "p1",
            "text": "hello",
            "author": {"id": "a1", "userName": "alice"}
        })]
    );
}

#[tokio::test]
async fn test_author_shared_across_posts_and_refreshed() {
    let (repo, pool) = setup().await;
    let p = params(json!({"handle": "alice"}));

    let items = vec![
        json!({"id": "p1", "author": {"id": "a1", "userName": "alice"}}),
        json!({"id": "p2", "author": {"id": "a1", "userName": "alice", "name": "Alice"}}),
    ];
    repo.save("f1", "profile", &p, &items, None, PayloadMode::Min)
        .await
        .unwrap();

    assert_eq!(count(&pool, "authors").await, 1);

    let got = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();
    // The second sighting added the display name; both posts render it.
    assert_eq!(
        got[0].get("author").and_then(|a| a.get("name")),
        Some(&json!("Alice"))
    );
}

#[tokio::test]
async fn test_dangling_item_is_skipped_not_fatal() {
    let (repo, pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));

    repo.save(
        "f1",
        "topic",
        &p,
        &[json!({"id": "p1"}), json!({"id": "p2"})],
        None,
        PayloadMode::Min,
    )
    .await
    .unwrap();

    // Simulate external surgery on the store: remove a post out from
    // under its cache item.
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM posts WHERE id = 'p1'")
        .execute(&pool)
        .await
        .unwrap();

    let got = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].get("id"), Some(&json!("p2")));
}

#[tokio::test]
async fn test_legacy_timestamp_round_trips_as_rfc3339() {
    let (repo, _pool) = setup().await;
    let p = params(json!({"handle": "alice"}));
    let items = vec![json!({
        "id": "p1",
        "text": "old format",
        "createdAt": "Wed Oct 10 20:19:24 +0000 2018"
    })];

    repo.save("f1", "profile", &p, &items, None, PayloadMode::Min)
        .await
        .unwrap();

    let got = repo.get("f1", PayloadMode::Min).await.unwrap().unwrap();
    assert_eq!(got[0].get("createdAt"), Some(&json!("2018-10-10T20:19:24+00:00")));
}

#[tokio::test]
async fn test_dataset_id_is_replaced_on_resave() {
    let (repo, _pool) = setup().await;
    let p = params(json!({"searchTerms": ["rust"]}));

    let first = repo
        .save("f1", "topic", &p, &[json!({"id": "p1"})], Some("run-1"), PayloadMode::Min)
        .await
        .unwrap();
    assert_eq!(first.dataset_id.as_deref(), Some("run-1"));

    let second = repo
        .save("f1", "topic", &p, &[json!({"id": "p1"})], Some("run-2"), PayloadMode::Min)
        .await
        .unwrap();
    assert_eq!(second.dataset_id.as_deref(), Some("run-2"));
}
