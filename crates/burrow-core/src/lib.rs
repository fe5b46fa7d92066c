//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the data model, the URL canonicalizer and the
//! store/cache seams shared by the shortener and redirector services.

pub mod api;
pub mod cache;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod shortener;
pub mod store;
pub mod url;

pub use cache::RecordCache;
pub use error::{CacheError, CoreError, ErrorKind, ServiceError, StorageError};
pub use record::{ExpirationPolicy, ShortUrlRecord};
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, Shortener};
pub use store::RecordStore;
pub use crate::url::{canonicalize, CanonicalUrl};
