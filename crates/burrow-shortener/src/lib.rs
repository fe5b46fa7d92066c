//! URL shortening service.
//!
//! [`ShortenerService`] turns a raw URL into a persisted
//! [`ShortUrlRecord`](burrow_core::ShortUrlRecord), reusing the existing
//! binding when the canonical URL was shortened before.

pub mod config;
pub mod service;

pub use config::ShortenerConfig;
pub use service::ShortenerService;
