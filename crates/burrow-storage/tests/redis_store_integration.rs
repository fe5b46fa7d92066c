use std::sync::Arc;
use std::time::Duration;

use burrow_core::{CanonicalUrl, RecordStore, ShortCode, ShortUrlRecord, StorageError};
use burrow_storage::redis::DEFAULT_KEY_PREFIX;
use burrow_storage::RedisRecordStore;
use burrow_test_infra::redis::RedisServer;
use jiff::{SignedDuration, Timestamp};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

struct Fixture {
    _redis: RedisServer,
    conn: MultiplexedConnection,
    store: RedisRecordStore,
}

impl Fixture {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("start redis");
        let conn = redis.connection().await.expect("redis connection");

        Self {
            _redis: redis,
            store: RedisRecordStore::new(conn.clone()),
            conn,
        }
    }
}

fn record(code: &str, url: &str, expires_at: Option<Timestamp>) -> ShortUrlRecord {
    ShortUrlRecord::new(
        ShortCode::new_unchecked(code),
        CanonicalUrl::new_unchecked(url),
        Timestamp::now(),
        expires_at,
    )
}

#[tokio::test]
#[ignore = "requires docker"]
async fn put_and_get_record() {
    let fixture = Fixture::start().await;
    let expires_at = Timestamp::now() + SignedDuration::from_secs(3600);
    let r = record("abc123", "https://example.com", Some(expires_at));

    assert!(fixture.store.put_if_absent(&r).await.unwrap());

    let got = fixture.store.get_by_code(&r.code).await.unwrap().unwrap();
    assert_eq!(got.long_url, r.long_url);
    assert_eq!(got.click_count, 0);
    assert_eq!(
        got.expires_at.map(|t| t.as_microsecond()),
        Some(expires_at.as_microsecond())
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn missing_code_returns_none() {
    let fixture = Fixture::start().await;
    let got = fixture
        .store
        .get_by_code(&ShortCode::new_unchecked("nothere"))
        .await
        .unwrap();
    assert!(got.is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn second_put_loses_to_live_record() {
    let fixture = Fixture::start().await;

    assert!(fixture
        .store
        .put_if_absent(&record("abc123", "https://one.example", None))
        .await
        .unwrap());
    assert!(!fixture
        .store
        .put_if_absent(&record("abc123", "https://two.example", None))
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn concurrent_creates_have_single_winner() {
    let fixture = Fixture::start().await;
    let store = Arc::new(fixture.store.clone());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let r = record("abc123", &format!("https://{i}.example"), None);
                store.put_if_absent(&r).await.unwrap()
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn increments_are_atomic() {
    let fixture = Fixture::start().await;
    let r = record("abc123", "https://example.com", None);
    fixture.store.put_if_absent(&r).await.unwrap();

    let store = Arc::new(fixture.store.clone());
    let handles: Vec<_> = (0..50)
        .map(|_| {
            let store = Arc::clone(&store);
            let code = r.code.clone();
            tokio::spawn(async move { store.increment_clicks(&code).await.unwrap() })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let got = fixture.store.get_by_code(&r.code).await.unwrap().unwrap();
    assert_eq!(got.click_count, 50);

    let err = fixture
        .store
        .increment_clicks(&ShortCode::new_unchecked("nothere"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn expired_record_is_replaced() {
    let fixture = Fixture::start().await;
    let code = ShortCode::new_unchecked("abc123");
    let expires_at = Timestamp::now() + SignedDuration::from_millis(50);

    assert!(fixture
        .store
        .put_if_absent(&record("abc123", "https://old.example", Some(expires_at)))
        .await
        .unwrap());
    fixture.store.increment_clicks(&code).await.unwrap();
    fixture.store.increment_clicks(&code).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(fixture
        .store
        .put_if_absent(&record("abc123", "https://new.example", None))
        .await
        .unwrap());

    let got = fixture.store.get_by_code(&code).await.unwrap().unwrap();
    assert_eq!(got.long_url.as_str(), "https://new.example");
    assert_eq!(got.click_count, 0);
    assert_eq!(got.expires_at, None);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn expired_hash_without_ttl_is_replaced() {
    let fixture = Fixture::start().await;
    let expired = Timestamp::now() - SignedDuration::from_secs(1);
    let key = format!("{DEFAULT_KEY_PREFIX}abc123");

    // a hash whose deadline passed but whose key never got a TTL
    let mut conn = fixture.conn.clone();
    let _: () = conn
        .hset_multiple(
            &key,
            &[
                ("long_url", "https://old.example".to_string()),
                ("created_at", expired.as_microsecond().to_string()),
                ("click_count", "9".to_string()),
                ("expires_at", expired.as_microsecond().to_string()),
            ],
        )
        .await
        .unwrap();

    let stale = fixture
        .store
        .get_by_code(&ShortCode::new_unchecked("abc123"))
        .await
        .unwrap()
        .unwrap();
    assert!(stale.is_expired());
    assert_eq!(stale.click_count, 9);

    assert!(fixture
        .store
        .put_if_absent(&record("abc123", "https://new.example", None))
        .await
        .unwrap());

    let got = fixture
        .store
        .get_by_code(&ShortCode::new_unchecked("abc123"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.long_url.as_str(), "https://new.example");
    assert_eq!(got.click_count, 0);
    let ttl: i64 = conn.pttl(&key).await.unwrap();
    assert_eq!(ttl, -1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn expiring_record_gets_a_key_deadline() {
    let fixture = Fixture::start().await;
    let expires_at = Timestamp::now() + SignedDuration::from_secs(3600);
    let key = format!("{DEFAULT_KEY_PREFIX}abc123");

    fixture
        .store
        .put_if_absent(&record("abc123", "https://example.com", Some(expires_at)))
        .await
        .unwrap();

    let mut conn = fixture.conn.clone();
    let ttl: i64 = conn.pttl(&key).await.unwrap();
    assert!(ttl > 0 && ttl <= 3_600_001, "pttl {ttl}");
}
