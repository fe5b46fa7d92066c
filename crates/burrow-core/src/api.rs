//! Typed request and response payloads exchanged with a dispatcher.

use crate::error::{ErrorKind, ServiceError};
use crate::record::ShortUrlRecord;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// One operation requested by a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Shorten { url: String },
    Resolve { code: String },
    Stats { code: String },
}

/// Result of a successful `Shorten`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortened {
    pub code: ShortCode,
    pub long_url: String,
    pub created_at: Timestamp,
}

/// Result of a successful `Resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    pub long_url: String,
}

/// Result of a successful `Stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub code: ShortCode,
    pub long_url: String,
    pub click_count: u64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Shortened(Shortened),
    Resolved(Resolved),
    Stats(LinkStats),
}

/// Serializable form of a [`ServiceError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ShortUrlRecord> for Shortened {
    fn from(record: &ShortUrlRecord) -> Self {
        Self {
            code: record.code.clone(),
            long_url: record.long_url.to_string(),
            created_at: record.created_at,
        }
    }
}

impl From<&ShortUrlRecord> for Resolved {
    fn from(record: &ShortUrlRecord) -> Self {
        Self {
            long_url: record.long_url.to_string(),
        }
    }
}

impl From<&ShortUrlRecord> for LinkStats {
    fn from(record: &ShortUrlRecord) -> Self {
        Self {
            code: record.code.clone(),
            long_url: record.long_url.to_string(),
            click_count: record.click_count,
            created_at: record.created_at,
        }
    }
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
