use crate::error::ServiceError;
use crate::record::{ExpirationPolicy, ShortUrlRecord};
use async_trait::async_trait;

type Result<T> = std::result::Result<T, ServiceError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The URL to be shortened, as supplied by the caller.
    pub url: String,
    /// Expiration policy; `None` applies the service default.
    pub expiration: Option<ExpirationPolicy>,
}

impl ShortenParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: ExpirationPolicy) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the record bound to the canonical form of `params.url`,
    /// creating it if no live binding exists.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortUrlRecord>;
}
