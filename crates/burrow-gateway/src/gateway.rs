use std::sync::Arc;

use crate::error::Result;
use crate::settings::GatewaySettings;
use burrow_cache::LruRecordCache;
use burrow_core::api::{ErrorBody, LinkStats, Request, Resolved, Response, Shortened};
use burrow_core::{ErrorKind, RecordStore, ServiceError, ShortCode, ShortenParams, Shortener};
use burrow_generator::HashGenerator;
use burrow_redirector::{Redirector, RedirectorService};
use burrow_shortener::ShortenerService;
use serde::Serialize;
use tracing::{debug, warn};

/// Serializable outcome of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Ok(Response),
    Err { error: ErrorBody },
}

impl Reply {
    /// Reply for input that does not decode as a [`Request`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Reply::Err {
            error: ErrorBody {
                kind: ErrorKind::InvalidRequest,
                message: message.into(),
            },
        }
    }
}

impl From<std::result::Result<Response, ServiceError>> for Reply {
    fn from(result: std::result::Result<Response, ServiceError>) -> Self {
        match result {
            Ok(response) => Reply::Ok(response),
            Err(e) => Reply::Err {
                error: ErrorBody::from(&e),
            },
        }
    }
}

/// Dispatches requests to the shortening and resolution services.
///
/// Both services share the store and the cache handed to
/// [`Gateway::new`], so a freshly shortened code resolves from the cache.
#[derive(Clone)]
pub struct Gateway {
    shortener: Arc<dyn Shortener>,
    redirector: Arc<dyn Redirector>,
}

impl Gateway {
    pub fn new(store: Arc<dyn RecordStore>, settings: GatewaySettings) -> Result<Self> {
        let cache = Arc::new(LruRecordCache::new(settings.cache)?);
        let generator = Arc::new(HashGenerator::new(settings.generator)?);

        let shortener = ShortenerService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            generator,
            settings.shortener,
        );
        let redirector = RedirectorService::new(store, cache, settings.redirector);

        Ok(Self::from_parts(Arc::new(shortener), Arc::new(redirector)))
    }

    /// Assembles a gateway from already-built services.
    pub fn from_parts(shortener: Arc<dyn Shortener>, redirector: Arc<dyn Redirector>) -> Self {
        Self {
            shortener,
            redirector,
        }
    }

    pub async fn shorten(&self, url: &str) -> std::result::Result<Shortened, ServiceError> {
        self.shorten_with(ShortenParams::new(url)).await
    }

    pub async fn shorten_with(
        &self,
        params: ShortenParams,
    ) -> std::result::Result<Shortened, ServiceError> {
        let record = self.shortener.shorten(params).await?;
        Ok(Shortened::from(&record))
    }

    pub async fn resolve(&self, code: &str) -> std::result::Result<Resolved, ServiceError> {
        let code = ShortCode::new(code)?;
        let record = self.redirector.resolve(&code).await?;
        Ok(Resolved::from(&record))
    }

    pub async fn stats(&self, code: &str) -> std::result::Result<LinkStats, ServiceError> {
        let code = ShortCode::new(code)?;
        let record = self.redirector.stats(&code).await?;
        Ok(LinkStats::from(&record))
    }

    pub async fn dispatch(&self, request: Request) -> std::result::Result<Response, ServiceError> {
        debug!(?request, "dispatching request");
        match request {
            Request::Shorten { url } => self.shorten(&url).await.map(Response::Shortened),
            Request::Resolve { code } => self.resolve(&code).await.map(Response::Resolved),
            Request::Stats { code } => self.stats(&code).await.map(Response::Stats),
        }
    }

    /// Like [`Gateway::dispatch`], folding errors into the reply.
    pub async fn reply(&self, request: Request) -> Reply {
        self.dispatch(request).await.into()
    }

    /// Decodes one JSON request and replies to it.
    ///
    /// Input that is not a valid [`Request`] gets an `invalid_request`
    /// error reply, so every line is answered.
    pub async fn reply_line(&self, line: &str) -> Reply {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.reply(request).await,
            Err(e) => {
                warn!(error = %e, line = %line, "malformed request");
                Reply::invalid_request(format!("malformed request: {e}"))
            }
        }
    }
}
