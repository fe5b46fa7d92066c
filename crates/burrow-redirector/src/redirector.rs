use async_trait::async_trait;
use burrow_core::{ServiceError, ShortCode, ShortUrlRecord};

type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its live record and accounts one click.
    ///
    /// The returned record carries the click count observed before this
    /// resolution. Fails with `NotFound` for unknown codes and `Expired`
    /// for records past their expiry.
    async fn resolve(&self, code: &ShortCode) -> Result<ShortUrlRecord>;

    /// Reads the authoritative record, click count included, from the store.
    async fn stats(&self, code: &ShortCode) -> Result<ShortUrlRecord>;
}
