use crate::timeout::StoreTimeouts;
use async_trait::async_trait;
use burrow_core::store::{RecordStore, Result};
use burrow_core::{CanonicalUrl, ShortCode, ShortUrlRecord, StorageError};
use jiff::Timestamp;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

pub const DEFAULT_KEY_PREFIX: &str = "burrow:url:";

const FIELD_LONG_URL: &str = "long_url";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_CLICK_COUNT: &str = "click_count";
const FIELD_EXPIRES_AT: &str = "expires_at";

// KEYS[1] record key
// ARGV: long_url, created_at, expires_at ('' if none), now, pexpireat ('' if none)
const CREATE_IF_ABSENT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  local expires_at = redis.call('HGET', KEYS[1], 'expires_at')
  if not expires_at or expires_at == '' or tonumber(expires_at) > tonumber(ARGV[4]) then
    return 0
  end
  redis.call('DEL', KEYS[1])
end
redis.call('HSET', KEYS[1],
  'long_url', ARGV[1],
  'created_at', ARGV[2],
  'click_count', 0,
  'expires_at', ARGV[3])
if ARGV[5] ~= '' then
  redis.call('PEXPIREAT', KEYS[1], ARGV[5])
end
return 1
"#;

const INCREMENT_IF_EXISTS: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return -1
end
return redis.call('HINCRBY', KEYS[1], 'click_count', 1)
"#;

/// [`RecordStore`] backed by Redis.
///
/// Each record is a hash at `<prefix><code>`. Creation and increments run
/// as Lua scripts, which Redis executes atomically. Records with an expiry
/// carry a matching `PEXPIREAT`, so Redis reclaims them on its own.
#[derive(Clone)]
pub struct RedisRecordStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    timeouts: StoreTimeouts,
    create_script: Script,
    increment_script: Script,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Query(message)
    }
}

fn invalid(key: &str, field: &str, detail: impl std::fmt::Display) -> StorageError {
    StorageError::InvalidData(format!("field '{field}' of '{key}': {detail}"))
}

fn parse_timestamp(key: &str, field: &str, raw: &str) -> Result<Timestamp> {
    let micros: i64 = raw.parse().map_err(|e| invalid(key, field, e))?;
    Timestamp::from_microsecond(micros).map_err(|e| invalid(key, field, e))
}

fn decode_record(
    key: &str,
    code: &ShortCode,
    mut fields: HashMap<String, String>,
) -> Result<ShortUrlRecord> {
    let long_url = fields
        .remove(FIELD_LONG_URL)
        .ok_or_else(|| invalid(key, FIELD_LONG_URL, "missing"))?;
    let created_at = fields
        .get(FIELD_CREATED_AT)
        .ok_or_else(|| invalid(key, FIELD_CREATED_AT, "missing"))
        .and_then(|raw| parse_timestamp(key, FIELD_CREATED_AT, raw))?;
    let click_count = fields
        .get(FIELD_CLICK_COUNT)
        .ok_or_else(|| invalid(key, FIELD_CLICK_COUNT, "missing"))?
        .parse::<u64>()
        .map_err(|e| invalid(key, FIELD_CLICK_COUNT, e))?;
    let expires_at = match fields.get(FIELD_EXPIRES_AT).map(String::as_str) {
        None | Some("") => None,
        Some(raw) => Some(parse_timestamp(key, FIELD_EXPIRES_AT, raw)?),
    };

    Ok(ShortUrlRecord {
        code: code.clone(),
        long_url: CanonicalUrl::new_unchecked(long_url),
        created_at,
        click_count,
        expires_at,
    })
}

impl RedisRecordStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a store whose keys start with `key_prefix` (e.g. `"myapp:url:"`).
    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            timeouts: StoreTimeouts::default(),
            create_script: Script::new(CREATE_IF_ABSENT),
            increment_script: Script::new(INCREMENT_IF_EXISTS),
        }
    }

    pub fn with_timeouts(mut self, timeouts: StoreTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str, timeouts: StoreTimeouts) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid redis url", e))?;
        let conn = timeouts
            .bound("connect", async {
                client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| map_redis_error("failed to connect to Redis", e))
            })
            .await?;
        Ok(Self::new(conn).with_timeouts(timeouts))
    }

    fn record_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }
}

impl std::fmt::Debug for RedisRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRecordStore")
            .field("key_prefix", &self.key_prefix)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        let key = self.record_key(code);
        trace!(code = %code, "fetching record from Redis");

        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = self
            .timeouts
            .bound("get_by_code", async {
                conn.hgetall(&key).await.map_err(|e| {
                    warn!(code = %code, error = %e, "Redis error on get");
                    map_redis_error("failed to fetch record from Redis", e)
                })
            })
            .await?;

        if fields.is_empty() {
            return Ok(None);
        }
        decode_record(&key, code, fields).map(Some)
    }

    async fn put_if_absent(&self, record: &ShortUrlRecord) -> Result<bool> {
        let key = self.record_key(&record.code);
        let expires_at = record
            .expires_at
            .map(|ts| ts.as_microsecond().to_string())
            .unwrap_or_default();
        let pexpire_at = record
            .expires_at
            .map(|ts| ts.as_microsecond().div_euclid(1_000).saturating_add(1).to_string())
            .unwrap_or_default();
        let now = Timestamp::now().as_microsecond();

        let mut conn = self.conn.clone();
        let created: i64 = self
            .timeouts
            .bound("put_if_absent", async {
                self.create_script
                    .key(&key)
                    .arg(record.long_url.as_str())
                    .arg(record.created_at.as_microsecond())
                    .arg(expires_at)
                    .arg(now)
                    .arg(pexpire_at)
                    .invoke_async(&mut conn)
                    .await
                    .map_err(|e| {
                        warn!(code = %record.code, error = %e, "Redis error on create");
                        map_redis_error("failed to create record in Redis", e)
                    })
            })
            .await?;

        debug!(code = %record.code, created = created == 1, "create-if-absent finished");
        Ok(created == 1)
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<u64> {
        let key = self.record_key(code);

        let mut conn = self.conn.clone();
        let count: i64 = self
            .timeouts
            .bound("increment_clicks", async {
                self.increment_script
                    .key(&key)
                    .invoke_async(&mut conn)
                    .await
                    .map_err(|e| {
                        warn!(code = %code, error = %e, "Redis error on increment");
                        map_redis_error("failed to increment clicks in Redis", e)
                    })
            })
            .await?;

        u64::try_from(count).map_err(|_| StorageError::NotFound(code.to_string()))
    }

    async fn delete_expired(&self) -> Result<u64> {
        // PEXPIREAT already reclaims expired keys
        Ok(0)
    }
}
