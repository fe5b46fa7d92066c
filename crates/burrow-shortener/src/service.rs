use crate::config::ShortenerConfig;
use async_trait::async_trait;
use burrow_core::{
    canonicalize, CanonicalUrl, RecordCache, RecordStore, ServiceError, ShortUrlRecord,
    ShortenParams, Shortener,
};
use burrow_generator::{allocate, Allocation, GenerateError, Generator};
use jiff::Timestamp;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Shortens URLs against a [`RecordStore`], fronted by a [`RecordCache`].
///
/// Codes come from a deterministic [`Generator`], so a URL that was
/// shortened before is found again by re-deriving its candidates and
/// reading them back from the store. The store's `put_if_absent` decides
/// races between concurrent callers; losers converge on the winner's
/// record.
pub struct ShortenerService<S: ?Sized, C: ?Sized, G: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<S: ?Sized, C: ?Sized, G: ?Sized> Clone for ShortenerService<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<S, C, G> ShortenerService<S, C, G>
where
    S: RecordStore + ?Sized,
    C: RecordCache + ?Sized,
    G: Generator + ?Sized,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, generator: Arc<G>, config: ShortenerConfig) -> Self {
        Self {
            store,
            cache,
            generator,
            config,
        }
    }

    /// Returns the cached live record for `url`, evicting an expired one.
    fn cached(&self, url: &CanonicalUrl, now: Timestamp) -> Option<ShortUrlRecord> {
        let record = self.cache.get_by_url(url)?;
        if record.is_expired_at(now) {
            debug!(code = %record.code, url = %url, "dropping expired cache entry");
            self.cache.remove(&record.code);
            return None;
        }
        Some(record)
    }

    fn exhausted(&self, url: &CanonicalUrl) -> ServiceError {
        error!(
            url = %url,
            attempts = self.config.max_attempts,
            "no free short code left for url"
        );
        ServiceError::CodeSpaceExhausted {
            url: url.to_string(),
            attempts: self.config.max_attempts,
        }
    }
}

#[async_trait]
impl<S, C, G> Shortener for ShortenerService<S, C, G>
where
    S: RecordStore + ?Sized,
    C: RecordCache + ?Sized,
    G: Generator + ?Sized,
{
    async fn shorten(&self, params: ShortenParams) -> Result<ShortUrlRecord, ServiceError> {
        trace!(raw = %params.url, state = "canonicalizing");
        let url = canonicalize(&params.url)?;
        let now = Timestamp::now();

        trace!(url = %url, state = "lookup_existing");
        if let Some(record) = self.cached(&url, now) {
            debug!(code = %record.code, url = %url, "shortened url served from cache");
            return Ok(record);
        }

        let expires_at = params
            .expiration
            .unwrap_or_else(|| self.config.default_expiration())
            .expires_at(now);

        let budget = self.config.max_attempts;
        let mut first_attempt = 0;

        loop {
            if first_attempt >= budget {
                return Err(self.exhausted(&url));
            }

            trace!(url = %url, first_attempt, state = "generating");
            let allocation = allocate(
                &*self.generator,
                &url,
                first_attempt,
                budget,
                now,
                |code| async move { self.store.get_by_code(&code).await },
            )
            .await
            .map_err(|e| match e {
                GenerateError::Oracle(err) => {
                    warn!(url = %url, error = %err, "store lookup failed while generating");
                    ServiceError::from(err)
                }
                GenerateError::Exhausted { .. } => self.exhausted(&url),
            })?;

            let (code, attempt) = match allocation {
                Allocation::Reuse(record) => {
                    debug!(code = %record.code, url = %url, state = "cached", "reusing existing binding");
                    self.cache.put(record.clone());
                    return Ok(record);
                }
                Allocation::Fresh { code, attempt } => (code, attempt),
            };

            trace!(code = %code, attempt, state = "persisting");
            let record = ShortUrlRecord::new(code, url.clone(), now, expires_at);
            let created = self.store.put_if_absent(&record).await.map_err(|e| {
                warn!(code = %record.code, error = %e, "failed to persist record");
                ServiceError::from(e)
            })?;

            if created {
                self.cache.put(record.clone());
                info!(code = %record.code, url = %url, attempt, state = "done", "shortened url");
                return Ok(record);
            }

            // the winner's binding is read back before any budget is spent
            debug!(code = %record.code, attempt, "lost create race, re-examining candidate");
            let winner = self.store.get_by_code(&record.code).await.map_err(|e| {
                warn!(code = %record.code, error = %e, "store lookup failed after lost race");
                ServiceError::from(e)
            })?;
            match winner {
                Some(winner) if !winner.is_expired_at(now) && winner.long_url == url => {
                    debug!(code = %winner.code, url = %url, "converged on winning record");
                    self.cache.put(winner.clone());
                    return Ok(winner);
                }
                _ => first_attempt = attempt + 1,
            }
        }
    }
}
