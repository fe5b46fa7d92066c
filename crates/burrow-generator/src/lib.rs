//! Short code derivation and collision resolution.

pub mod error;
pub mod hash;

pub use error::{Error, GenerateError};
pub use hash::{HashGenerator, HashGeneratorSettings};

use burrow_core::{CanonicalUrl, ShortCode, ShortUrlRecord};
use jiff::Timestamp;
use std::future::Future;
use tracing::debug;

/// Default number of candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Trait for deriving short codes.
///
/// Implementations are pure functions of their input and don't interact
/// with storage: the same `(url, attempt)` pair must always produce the
/// same code, which is what lets a re-derivation stand in for a reverse
/// lookup from URL to code.
pub trait Generator: Send + Sync + 'static {
    /// Derives the candidate code for `url` at disambiguation `attempt`.
    fn candidate(&self, url: &CanonicalUrl, attempt: u32) -> ShortCode;
}

/// Outcome of [`allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// A live record already binds a candidate to this URL.
    Reuse(ShortUrlRecord),
    /// `code` is free (or only held by an expired record) at `attempt`.
    Fresh { code: ShortCode, attempt: u32 },
}

/// Walks the candidate sequence for `url` starting at `first_attempt`.
///
/// `lookup` is the existence oracle: it returns the record currently bound
/// to a code, if any. For each candidate:
/// - no binding, or an expired one: the code is [`Allocation::Fresh`]
/// - a live binding to `url`: [`Allocation::Reuse`]
/// - a live binding to another URL: collision, try the next attempt
///
/// Fails with [`GenerateError::Exhausted`] once `max_attempts` candidates
/// have collided.
pub async fn allocate<G, F, Fut, E>(
    generator: &G,
    url: &CanonicalUrl,
    first_attempt: u32,
    max_attempts: u32,
    now: Timestamp,
    mut lookup: F,
) -> Result<Allocation, GenerateError<E>>
where
    G: Generator + ?Sized,
    F: FnMut(ShortCode) -> Fut,
    Fut: Future<Output = Result<Option<ShortUrlRecord>, E>>,
{
    for attempt in first_attempt..max_attempts {
        let code = generator.candidate(url, attempt);

        match lookup(code.clone()).await.map_err(GenerateError::Oracle)? {
            None => return Ok(Allocation::Fresh { code, attempt }),
            Some(existing) if existing.is_expired_at(now) => {
                debug!(code = %code, attempt, "candidate held by expired record");
                return Ok(Allocation::Fresh { code, attempt });
            }
            Some(existing) if existing.long_url == *url => {
                return Ok(Allocation::Reuse(existing));
            }
            Some(existing) => {
                debug!(
                    code = %code,
                    attempt,
                    bound_to = %existing.long_url,
                    "candidate collides with another url"
                );
            }
        }
    }

    Err(GenerateError::Exhausted {
        attempts: max_attempts,
    })
}
