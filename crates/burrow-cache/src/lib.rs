//! Process-local record cache for the Burrow services.

pub mod lru;

pub use self::lru::{CacheConfig, CacheEntry, CacheStats, LruRecordCache, DEFAULT_CAPACITY};
pub use burrow_core::CacheError;
