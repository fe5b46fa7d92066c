use crate::timeout::StoreTimeouts;
use async_trait::async_trait;
use burrow_core::store::{RecordStore, Result};
use burrow_core::{CanonicalUrl, ShortCode, ShortUrlRecord, StorageError};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace};

/// Schema expected by [`MySqlRecordStore`].
pub const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

/// [`RecordStore`] backed by a MySQL `short_urls` table.
///
/// The primary key on `short_code` arbitrates concurrent creation, and
/// increments are a single `UPDATE` so InnoDB's row lock serializes them.
/// Timestamps are stored as microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct MySqlRecordStore {
    pool: MySqlPool,
    timeouts: StoreTimeouts,
}

impl MySqlRecordStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            timeouts: StoreTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: StoreTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Opens a new connection pool for `database_url`.
    pub async fn connect(database_url: &str, timeouts: StoreTimeouts) -> Result<Self> {
        let pool = timeouts
            .bound("connect", async {
                MySqlPool::connect(database_url)
                    .await
                    .map_err(map_sqlx_error)
            })
            .await?;
        Ok(Self::new(pool).with_timeouts(timeouts))
    }

    /// Creates the `short_urls` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn parse_micros(column: &str, value: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(value).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{value}': {e}"))
    })
}

fn decode_row(row: &MySqlRow) -> Result<ShortUrlRecord> {
    let code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let click_count: u64 = row.try_get("click_count").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;

    let code = ShortCode::new(code).map_err(|e| StorageError::InvalidData(e.to_string()))?;

    Ok(ShortUrlRecord {
        code,
        long_url: CanonicalUrl::new_unchecked(long_url),
        created_at: parse_micros("created_at", created_at)?,
        click_count,
        expires_at: expires_at
            .map(|value| parse_micros("expires_at", value))
            .transpose()?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl RecordStore for MySqlRecordStore {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        trace!(code = %code, "fetching record from MySQL");

        let row = self
            .timeouts
            .bound("get_by_code", async {
                sqlx::query(
                    r#"
                    SELECT short_code, long_url, created_at, click_count, expires_at
                    FROM short_urls
                    WHERE short_code = ?
                    LIMIT 1
                    "#,
                )
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)
            })
            .await?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn put_if_absent(&self, record: &ShortUrlRecord) -> Result<bool> {
        let now = Timestamp::now().as_microsecond();

        self.timeouts
            .bound("put_if_absent", async {
                // an expired holder no longer owns the code
                let reclaimed = sqlx::query(
                    r#"
                    DELETE FROM short_urls
                    WHERE short_code = ?
                      AND expires_at IS NOT NULL
                      AND expires_at <= ?
                    "#,
                )
                .bind(record.code.as_str())
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

                if reclaimed.rows_affected() > 0 {
                    debug!(code = %record.code, "reclaimed expired record");
                }

                let inserted = sqlx::query(
                    r#"
                    INSERT INTO short_urls (short_code, long_url, created_at, click_count, expires_at)
                    VALUES (?, ?, ?, 0, ?)
                    "#,
                )
                .bind(record.code.as_str())
                .bind(record.long_url.as_str())
                .bind(record.created_at.as_microsecond())
                .bind(record.expires_at.map(|ts| ts.as_microsecond()))
                .execute(&self.pool)
                .await;

                match inserted {
                    Ok(_) => Ok(true),
                    Err(err) if is_unique_violation(&err) => Ok(false),
                    Err(err) => Err(map_sqlx_error(err)),
                }
            })
            .await
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<u64> {
        self.timeouts
            .bound("increment_clicks", async {
                // LAST_INSERT_ID(expr) hands the new count back in the OK packet
                let result = sqlx::query(
                    r#"
                    UPDATE short_urls
                    SET click_count = LAST_INSERT_ID(click_count + 1)
                    WHERE short_code = ?
                    "#,
                )
                .bind(code.as_str())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

                if result.rows_affected() == 0 {
                    return Err(StorageError::NotFound(code.to_string()));
                }
                Ok(result.last_insert_id())
            })
            .await
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Timestamp::now().as_microsecond();

        self.timeouts
            .bound("delete_expired", async {
                let result = sqlx::query(
                    r#"
                    DELETE FROM short_urls
                    WHERE expires_at IS NOT NULL
                      AND expires_at <= ?
                    "#,
                )
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

                Ok(result.rows_affected())
            })
            .await
    }
}
