//! Short code resolution and click statistics.
//!
//! [`RedirectorService`] resolves codes through the record cache, falls
//! back to the store on a miss, and accounts one click per successful
//! resolution. Statistics are always read from the store, which is the
//! only authority on click counts.
//!
//! ```rust
//! use std::sync::Arc;
//! use burrow_cache::LruRecordCache;
//! use burrow_core::ShortCode;
//! use burrow_redirector::{Redirector, RedirectorConfig, RedirectorService};
//! use burrow_storage::InMemoryRecordStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedirectorService::new(
//!     Arc::new(InMemoryRecordStore::new()),
//!     Arc::new(LruRecordCache::default()),
//!     RedirectorConfig::default(),
//! );
//!
//! let code = ShortCode::new("abc123")?;
//! match service.resolve(&code).await {
//!     Ok(record) => println!("Redirect to: {}", record.long_url),
//!     Err(e) => println!("{}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod redirector;
pub mod service;

pub use config::{ClickAccounting, RedirectorConfig};
pub use redirector::Redirector;
pub use service::RedirectorService;
