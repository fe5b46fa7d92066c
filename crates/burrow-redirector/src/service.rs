use std::sync::Arc;

use crate::config::{ClickAccounting, RedirectorConfig};
use crate::redirector::Redirector;
use async_trait::async_trait;
use burrow_core::{RecordCache, RecordStore, ServiceError, ShortCode, ShortUrlRecord};
use jiff::Timestamp;
use tracing::{debug, trace, warn};

type Result<T> = std::result::Result<T, ServiceError>;

/// Service for resolving short codes and reporting their statistics.
///
/// Resolution checks the cache first and only reaches the store on a miss.
/// Click counts live in the store alone; cached records are never updated
/// with new counts.
pub struct RedirectorService<S: ?Sized, C: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    config: RedirectorConfig,
}

impl<S: ?Sized, C: ?Sized> Clone for RedirectorService<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

impl<S, C> RedirectorService<S, C>
where
    S: RecordStore + ?Sized,
    C: RecordCache + ?Sized,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, config: RedirectorConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Returns the live cached record for `code`, evicting an expired one.
    fn cached(&self, code: &ShortCode, now: Timestamp) -> Option<ShortUrlRecord> {
        let record = self.cache.get_by_code(code)?;
        if record.is_expired_at(now) {
            debug!(code = %code, "evicting expired record from cache");
            self.cache.remove(code);
            return None;
        }
        trace!(code = %code, "resolved from cache");
        Some(record)
    }

    async fn lookup(&self, code: &ShortCode, now: Timestamp) -> Result<ShortUrlRecord> {
        let record = self.store.get_by_code(code).await.map_err(|e| {
            warn!(code = %code, error = %e, "store lookup failed");
            ServiceError::from(e)
        })?;

        match record {
            Some(record) if record.is_expired_at(now) => {
                debug!(code = %code, "record has expired");
                Err(ServiceError::Expired(code.to_string()))
            }
            Some(record) => {
                self.cache.put(record.clone());
                Ok(record)
            }
            None => {
                trace!(code = %code, "short code not found");
                Err(ServiceError::NotFound(code.to_string()))
            }
        }
    }

    async fn account_click(&self, code: &ShortCode) {
        match self.config.click_accounting {
            ClickAccounting::Inline => {
                if let Err(e) = self.store.increment_clicks(code).await {
                    warn!(code = %code, error = %e, "failed to account click");
                }
            }
            ClickAccounting::Detached => {
                let store = Arc::clone(&self.store);
                let code = code.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.increment_clicks(&code).await {
                        warn!(code = %code, error = %e, "failed to account click");
                    }
                });
            }
        }
    }
}

#[async_trait]
impl<S, C> Redirector for RedirectorService<S, C>
where
    S: RecordStore + ?Sized,
    C: RecordCache + ?Sized,
{
    async fn resolve(&self, code: &ShortCode) -> Result<ShortUrlRecord> {
        trace!(code = %code, state = "lookup");
        let now = Timestamp::now();

        let record = match self.cached(code, now) {
            Some(record) => record,
            None => self.lookup(code, now).await?,
        };

        trace!(code = %code, state = "accounting");
        self.account_click(code).await;

        debug!(code = %code, url = %record.long_url, "resolved short code");
        Ok(record)
    }

    async fn stats(&self, code: &ShortCode) -> Result<ShortUrlRecord> {
        let record = self.store.get_by_code(code).await.map_err(|e| {
            warn!(code = %code, error = %e, "store lookup failed");
            ServiceError::from(e)
        })?;

        match record {
            Some(record) if !record.is_expired() => Ok(record),
            _ => Err(ServiceError::NotFound(code.to_string())),
        }
    }
}
