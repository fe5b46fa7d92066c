use crate::error::StorageError;
use crate::record::ShortUrlRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The durable, authoritative store of short URL records.
///
/// Implementations delegate atomicity to their backend: `put_if_absent`
/// and `increment_clicks` are the only cross-process synchronization
/// points, so both must be atomic with respect to concurrent callers in
/// any process.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Retrieves the record for a given short code.
    ///
    /// Expired records that the backend has not reclaimed yet are still
    /// returned; callers decide how to treat them.
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>>;

    /// Atomically creates `record` if no live record exists for its code.
    ///
    /// Returns `false` when another record already holds the code. An
    /// expired record holding the code is replaced.
    async fn put_if_absent(&self, record: &ShortUrlRecord) -> Result<bool>;

    /// Atomically increments the click count and returns the new value.
    ///
    /// Returns `Err(NotFound)` if no record exists for the code.
    async fn increment_clicks(&self, code: &ShortCode) -> Result<u64>;

    /// Removes every expired record and returns how many were removed.
    ///
    /// Invoked out-of-band, never per request.
    async fn delete_expired(&self) -> Result<u64>;
}
