use crate::shortcode::ShortCode;
use crate::url::CanonicalUrl;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored short URL record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrlRecord {
    /// Primary key, immutable once persisted.
    pub code: ShortCode,
    /// The canonical URL this code redirects to.
    pub long_url: CanonicalUrl,
    /// When the record was created.
    pub created_at: Timestamp,
    /// Number of resolutions accounted so far.
    pub click_count: u64,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
}

impl ShortUrlRecord {
    /// Creates a record with a zero click count.
    pub fn new(
        code: ShortCode,
        long_url: CanonicalUrl,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            code,
            long_url,
            created_at,
            click_count: 0,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    #[default]
    Never,
    /// The shortened URL expires after a certain duration from creation.
    AfterDuration(Duration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

impl ExpirationPolicy {
    /// Resolves the policy to an absolute expiry relative to `now`.
    ///
    /// Returns `None` for durations too large to represent, which is
    /// indistinguishable from never expiring in practice.
    pub fn expires_at(&self, now: Timestamp) -> Option<Timestamp> {
        match self {
            ExpirationPolicy::Never => None,
            ExpirationPolicy::AfterDuration(duration) => SignedDuration::try_from(*duration)
                .ok()
                .and_then(|duration| now.checked_add(duration).ok()),
            ExpirationPolicy::AtTimestamp(timestamp) => Some(*timestamp),
        }
    }
}
