use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to validating core value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache initialization failed: {0}")]
    Initialization(String),
}

/// Errors returned by a [`RecordStore`](crate::store::RecordStore) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// The error kinds visible to a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    NotFound,
    Expired,
    Unavailable,
    CodeSpaceExhausted,
    /// A transport could not decode the request. Services never return it.
    InvalidRequest,
}

/// Errors returned by the shortening and resolution services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("short code expired: {0}")]
    Expired(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("no free short code for {url} after {attempts} attempts")]
    CodeSpaceExhausted { url: String, attempts: u32 },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Expired(_) => ErrorKind::Expired,
            ServiceError::Unavailable(_) => ErrorKind::Unavailable,
            ServiceError::CodeSpaceExhausted { .. } => ErrorKind::CodeSpaceExhausted,
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound(code) => Self::NotFound(code),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidUrl(message) => Self::InvalidUrl(message),
            CoreError::InvalidShortCode(message) => Self::NotFound(message),
        }
    }
}
