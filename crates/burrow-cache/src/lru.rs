use ::lru::LruCache;
use burrow_core::{CacheError, CanonicalUrl, RecordCache, ShortCode, ShortUrlRecord};
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

pub const DEFAULT_CAPACITY: usize = 100;

/// Configuration for creating a [`LruRecordCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CacheConfig {
    /// Maximum number of records the cache can hold.
    #[builder(default = DEFAULT_CAPACITY)]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A cached record plus its recency marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    record: ShortUrlRecord,
    last_used: u64,
}

impl CacheEntry {
    pub fn record(&self) -> &ShortUrlRecord {
        &self.record
    }

    /// Logical tick of the most recent `get` or `put` touching this entry.
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    pub fn into_record(self) -> ShortUrlRecord {
        self.record
    }
}

/// Point-in-time counters for a [`LruRecordCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

struct Inner {
    by_code: LruCache<ShortCode, CacheEntry>,
    by_url: LruCache<CanonicalUrl, ShortCode>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Drops the URL index entry for `url` if it still points at `code`.
    fn unlink_url(&mut self, url: &CanonicalUrl, code: &ShortCode) {
        if self.by_url.peek(url) == Some(code) {
            self.by_url.pop(url);
        }
    }
}

/// A fixed-capacity, least-recently-used record cache.
///
/// Records are indexed by short code and by canonical URL. The code index
/// owns the records and enforces the capacity; the URL index only maps a
/// URL to a code. Evicting or removing a record also unlinks its URL, and
/// a URL whose code is no longer cached is reported as a miss.
///
/// Both indices sit behind one mutex that is held only for the map
/// mutation and recency update.
pub struct LruRecordCache {
    inner: Mutex<Inner>,
    capacity: NonZeroUsize,
}

impl LruRecordCache {
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(config.capacity).ok_or_else(|| {
            CacheError::Initialization("cache capacity must be greater than zero".to_string())
        })?;

        Ok(Self {
            inner: Mutex::new(Inner {
                by_code: LruCache::new(capacity),
                by_url: LruCache::new(capacity),
                tick: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity,
        })
    }

    /// Creates a cache holding at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Result<Self, CacheError> {
        Self::new(CacheConfig::builder().capacity(capacity).build())
    }

    /// Looks up an entry by code and marks it as most recently used.
    pub fn get(&self, code: &ShortCode) -> Option<CacheEntry> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        match inner.by_code.get_mut(code) {
            Some(entry) => {
                entry.last_used = tick;
                inner.by_url.promote(&entry.record.long_url);
                inner.hits += 1;
                trace!(code = %code, "cache hit");
                Some(entry.clone())
            }
            None => {
                inner.misses += 1;
                trace!(code = %code, "cache miss");
                None
            }
        }
    }

    /// Looks up an entry by canonical URL and marks it as most recently used.
    pub fn get_url(&self, url: &CanonicalUrl) -> Option<CacheEntry> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        let Some(code) = inner.by_url.get(url).cloned() else {
            inner.misses += 1;
            trace!(url = %url, "cache miss by url");
            return None;
        };

        match inner.by_code.get_mut(&code) {
            Some(entry) if entry.record.long_url == *url => {
                entry.last_used = tick;
                inner.hits += 1;
                trace!(url = %url, code = %code, "cache hit by url");
                Some(entry.clone())
            }
            _ => {
                // the code was evicted or rebound; the URL entry is stale
                inner.by_url.pop(url);
                inner.misses += 1;
                trace!(url = %url, code = %code, "dangling url index entry dropped");
                None
            }
        }
    }

    /// Inserts or refreshes `record` under its code and its URL.
    ///
    /// Returns the code of the record evicted to make room, if any.
    pub fn insert(&self, record: ShortUrlRecord) -> Option<ShortCode> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        let code = record.code.clone();
        let url = record.long_url.clone();
        let entry = CacheEntry {
            record,
            last_used: tick,
        };

        let mut evicted = None;
        if let Some((old_code, old_entry)) = inner.by_code.push(code.clone(), entry) {
            let replaced = old_code != code;
            if replaced || old_entry.record.long_url != url {
                inner.unlink_url(&old_entry.record.long_url, &old_entry.record.code);
            }
            if replaced {
                inner.evictions += 1;
                debug!(code = %old_code, "evicted least recently used record");
                evicted = Some(old_code);
            }
        }

        inner.by_url.push(url, code);
        evicted
    }

    /// Removes the record for `code` from both indices.
    pub fn invalidate(&self, code: &ShortCode) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.by_code.pop(code) {
            Some(entry) => {
                inner.unlink_url(&entry.record.long_url, code);
                trace!(code = %code, "removed record from cache");
                true
            }
            None => false,
        }
    }

    /// Checks for a cached code without touching its recency.
    pub fn contains(&self, code: &ShortCode) -> bool {
        self.inner.lock().by_code.contains(code)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.by_code.clear();
        inner.by_url.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            len: inner.by_code.len(),
            capacity: self.capacity.get(),
        }
    }
}

impl Default for LruRecordCache {
    fn default() -> Self {
        let capacity = NonZeroUsize::MIN.saturating_add(DEFAULT_CAPACITY - 1);
        Self {
            inner: Mutex::new(Inner {
                by_code: LruCache::new(capacity),
                by_url: LruCache::new(capacity),
                tick: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity,
        }
    }
}

impl std::fmt::Debug for LruRecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruRecordCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl RecordCache for LruRecordCache {
    fn get_by_code(&self, code: &ShortCode) -> Option<ShortUrlRecord> {
        self.get(code).map(CacheEntry::into_record)
    }

    fn get_by_url(&self, url: &CanonicalUrl) -> Option<ShortUrlRecord> {
        self.get_url(url).map(CacheEntry::into_record)
    }

    fn put(&self, record: ShortUrlRecord) {
        self.insert(record);
    }

    fn remove(&self, code: &ShortCode) {
        self.invalidate(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn record(c: &str, url: &str) -> ShortUrlRecord {
        ShortUrlRecord::new(
            code(c),
            CanonicalUrl::new_unchecked(url),
            Timestamp::now(),
            None,
        )
    }

    fn url(s: &str) -> CanonicalUrl {
        CanonicalUrl::new_unchecked(s)
    }

    #[test]
    fn default_capacity_is_one_hundred() {
        assert_eq!(LruRecordCache::default().capacity(), 100);
        assert_eq!(
            LruRecordCache::new(CacheConfig::default()).unwrap().capacity(),
            100
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = LruRecordCache::with_capacity(0).unwrap_err();
        assert!(matches!(err, CacheError::Initialization(_)));
    }

    #[test]
    fn get_and_put_by_both_keys() {
        let cache = LruRecordCache::with_capacity(4).unwrap();
        let r = record("abc123", "https://example.com");

        assert!(cache.get(&code("abc123")).is_none());
        cache.insert(r.clone());

        assert_eq!(cache.get(&code("abc123")).unwrap().record(), &r);
        assert_eq!(cache.get_url(&url("https://example.com")).unwrap().record(), &r);
        assert!(cache.get_url(&url("https://other.example")).is_none());
    }

    #[test]
    fn overflow_evicts_least_recently_used() {
        let cache = LruRecordCache::with_capacity(3).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));
        cache.insert(record("bbbbbb", "https://b.example"));
        cache.insert(record("cccccc", "https://c.example"));

        // touch a so b becomes the oldest
        assert!(cache.get(&code("aaaaaa")).is_some());

        let evicted = cache.insert(record("dddddd", "https://d.example"));
        assert_eq!(evicted, Some(code("bbbbbb")));

        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&code("aaaaaa")));
        assert!(!cache.contains(&code("bbbbbb")));
        assert!(cache.contains(&code("cccccc")));
        assert!(cache.contains(&code("dddddd")));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn untouched_entries_evict_in_insertion_order() {
        let cache = LruRecordCache::with_capacity(2).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));
        cache.insert(record("bbbbbb", "https://b.example"));

        assert_eq!(
            cache.insert(record("cccccc", "https://c.example")),
            Some(code("aaaaaa"))
        );
        assert_eq!(
            cache.insert(record("dddddd", "https://d.example")),
            Some(code("bbbbbb"))
        );
    }

    #[test]
    fn lookup_by_url_refreshes_recency() {
        let cache = LruRecordCache::with_capacity(2).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));
        cache.insert(record("bbbbbb", "https://b.example"));

        assert!(cache.get_url(&url("https://a.example")).is_some());

        assert_eq!(
            cache.insert(record("cccccc", "https://c.example")),
            Some(code("bbbbbb"))
        );
    }

    #[test]
    fn reinserting_refreshes_without_eviction() {
        let cache = LruRecordCache::with_capacity(2).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));
        cache.insert(record("bbbbbb", "https://b.example"));

        let mut updated = record("aaaaaa", "https://a.example");
        updated.click_count = 7;
        assert_eq!(cache.insert(updated), None);

        assert_eq!(cache.get(&code("aaaaaa")).unwrap().record().click_count, 7);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(
            cache.insert(record("cccccc", "https://c.example")),
            Some(code("bbbbbb"))
        );
    }

    #[test]
    fn eviction_unlinks_url_index() {
        let cache = LruRecordCache::with_capacity(1).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));
        cache.insert(record("bbbbbb", "https://b.example"));

        assert!(cache.get_url(&url("https://a.example")).is_none());
        assert!(cache.get_url(&url("https://b.example")).is_some());
    }

    #[test]
    fn rebinding_a_code_unlinks_its_old_url() {
        let cache = LruRecordCache::with_capacity(2).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));

        assert_eq!(cache.insert(record("aaaaaa", "https://new.example")), None);

        assert!(cache.get_url(&url("https://a.example")).is_none());
        assert_eq!(
            cache.get_url(&url("https://new.example")).unwrap().record().code,
            code("aaaaaa")
        );
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn evicted_code_is_reported_and_its_url_dropped() {
        let cache = LruRecordCache::with_capacity(1).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));

        let evicted = cache.insert(record("bbbbbb", "https://b.example"));

        assert_eq!(evicted, Some(code("aaaaaa")));
        assert!(!cache.contains(&code("aaaaaa")));
        assert!(cache.get_url(&url("https://a.example")).is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn invalidate_removes_both_keys() {
        let cache = LruRecordCache::with_capacity(4).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));

        assert!(cache.invalidate(&code("aaaaaa")));
        assert!(cache.get(&code("aaaaaa")).is_none());
        assert!(cache.get_url(&url("https://a.example")).is_none());
        assert!(cache.is_empty());

        // idempotent
        assert!(!cache.invalidate(&code("aaaaaa")));
    }

    #[test]
    fn get_advances_recency_marker() {
        let cache = LruRecordCache::with_capacity(4).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));

        let first = cache.get(&code("aaaaaa")).unwrap().last_used();
        let second = cache.get(&code("aaaaaa")).unwrap().last_used();
        assert!(second > first);
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let cache = LruRecordCache::with_capacity(4).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));

        cache.get(&code("aaaaaa"));
        cache.get(&code("zzzzzz"));
        cache.get_url(&url("https://a.example"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
        assert_eq!(stats.capacity, 4);
    }

    #[test]
    fn clear_empties_both_indices() {
        let cache = LruRecordCache::with_capacity(4).unwrap();
        cache.insert(record("aaaaaa", "https://a.example"));
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get_url(&url("https://a.example")).is_none());
    }

    #[test]
    fn record_cache_trait_round_trip() {
        let cache = LruRecordCache::with_capacity(4).unwrap();
        let r = record("aaaaaa", "https://a.example");
        let dyn_cache: &dyn RecordCache = &cache;

        dyn_cache.put(r.clone());
        assert_eq!(dyn_cache.get_by_code(&code("aaaaaa")), Some(r.clone()));
        assert_eq!(dyn_cache.get_by_url(&url("https://a.example")), Some(r));

        dyn_cache.remove(&code("aaaaaa"));
        assert_eq!(dyn_cache.get_by_code(&code("aaaaaa")), None);
    }

    #[test]
    fn concurrent_access_respects_capacity() {
        let cache = Arc::new(LruRecordCache::with_capacity(16).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let c = format!("c{:02}{:03}", t, i);
                        cache.insert(record(&c, &format!("https://{}.example", c)));
                        cache.get(&code(&c));
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 16);
        assert_eq!(cache.stats().evictions, 8 * 200 - 16);
    }
}
