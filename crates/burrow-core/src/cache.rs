use crate::record::ShortUrlRecord;
use crate::shortcode::ShortCode;
use crate::url::CanonicalUrl;

/// A process-local cache of short URL records.
///
/// Records are reachable both by short code (for resolution) and by
/// canonical URL (for shorten dedup). The store stays authoritative: a
/// cache may drop entries at any time and callers must fall back to the
/// store on a miss. Implementations never perform store I/O.
pub trait RecordCache: Send + Sync + 'static {
    /// Looks up a record by its short code, refreshing its recency.
    fn get_by_code(&self, code: &ShortCode) -> Option<ShortUrlRecord>;

    /// Looks up a record by the canonical URL it points to.
    fn get_by_url(&self, url: &CanonicalUrl) -> Option<ShortUrlRecord>;

    /// Inserts or refreshes a record under both of its keys.
    fn put(&self, record: ShortUrlRecord);

    /// Removes the record for `code` from every index.
    ///
    /// It is not an error if the code is not cached.
    fn remove(&self, code: &ShortCode);
}
