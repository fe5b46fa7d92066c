use burrow_core::CacheError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors raised while assembling a [`Gateway`](crate::Gateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),
    #[error("generator setup failed: {0}")]
    Generator(#[from] burrow_generator::Error),
}
