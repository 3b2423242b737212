//! Resilient HTTP fetch pipeline.
//!
//! ### Canonical requests
//! - URL canonicalized, query parameters merged and sorted
//! - The canonical URL doubles as the cache key
//!
//! ### Cache
//! - Hits return immediately without network I/O
//! - A hit requested as JSON is validated like a network body, since the
//!   entry may have been stored under another [`AcceptKind`]
//! - Only complete 200 bodies are stored; origin cache headers are ignored
//!
//! ### Retries
//! - Up to 3 attempts for transport failures, 429 and 500
//! - 1s then 2s backoff, abandoned as soon as the caller cancels
//! - 400/401/403/404 and any other non-200 status are terminal
//!
//! ### Accept negotiation
//! - The body is interpreted by the requested [`AcceptKind`], never by the
//!   returned Content-Type

pub mod retry;
pub mod url;

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub use retry::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES, backoff_delay};
pub use url::{UrlError, canonicalize, canonicalize_with_params};

use docfetch_core::{AppConfig, CacheStore, Error, StatusClass};
use retry::{FetchState, after_failure, wait_or_cancel};

/// Initial buffer size when the server does not declare a length.
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// How the caller intends to read the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AcceptKind {
    /// Structured data; the body must be valid JSON.
    #[default]
    Json,
    Pdf,
    Html,
    Image,
    /// Anything else, returned verbatim.
    Binary,
}

impl AcceptKind {
    /// Value sent in the `Accept` header.
    pub fn header_value(self) -> &'static str {
        match self {
            AcceptKind::Json => "application/json",
            AcceptKind::Pdf => "application/pdf",
            AcceptKind::Html => "text/html",
            AcceptKind::Image => "image/*",
            AcceptKind::Binary => "application/octet-stream",
        }
    }
}

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "docfetch/0.1")
    pub user_agent: String,

    /// Per-attempt request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Attempts per fetch including the first (default: 3)
    pub max_retries: u32,

    /// Delay before the second attempt (default: 1s)
    pub backoff_base: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "docfetch/0.1".to_string(),
            timeout: Duration::from_secs(30),
            max_bytes: 50 * 1024 * 1024,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
            ..Default::default()
        }
    }
}

/// Bytes returned by a fetch.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Canonical URL, also the cache key
    pub url: String,
    /// Response body, shared with the cache
    pub bytes: Bytes,
    /// Whether the body came from the cache
    pub from_cache: bool,
    /// Network attempts made (0 on a cache hit)
    pub attempts: u32,
}

/// HTTP fetcher with caching and bounded retries.
pub struct ResilientFetcher {
    http: Client,
    config: FetchConfig,
    cache: Arc<CacheStore>,
}

impl ResilientFetcher {
    /// Create a fetcher that stores responses in `cache`.
    pub fn new(config: FetchConfig, cache: Arc<CacheStore>) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, cache })
    }

    /// Fetch `url` with `params` merged into its query string.
    ///
    /// Returns the cached body when present. Otherwise runs the retry loop and
    /// caches a successful body. `cancel` aborts the backoff wait and any
    /// request in flight.
    pub async fn fetch(
        &self, cancel: &CancellationToken, url: &str, params: &[(String, String)], accept: AcceptKind,
    ) -> Result<FetchedDocument, Error> {
        let canonical = canonicalize_with_params(url, params).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        let key = canonical.to_string();

        if let Some(bytes) = self.cache.get(&key) {
            check_body(&key, accept, &bytes)?;
            self.cache.record_hit();
            tracing::debug!(url = %key, bytes = bytes.len(), "cache hit");
            return Ok(FetchedDocument { url: key, bytes, from_cache: true, attempts: 0 });
        }

        let (bytes, attempts) = self.fetch_with_retries(cancel, &canonical, accept).await?;

        self.cache.set(key.clone(), bytes.clone());
        self.cache.record_miss();

        Ok(FetchedDocument { url: key, bytes, from_cache: false, attempts })
    }

    async fn fetch_with_retries(
        &self, cancel: &CancellationToken, url: &reqwest::Url, accept: AcceptKind,
    ) -> Result<(Bytes, u32), Error> {
        let max_attempts = self.config.max_retries.max(1);
        let mut state = FetchState::Attempting { attempt: 1 };

        loop {
            state = match state {
                FetchState::Attempting { attempt } => {
                    tracing::debug!(url = %url, attempt, max_attempts, "sending request");
                    match self.attempt(cancel, url, accept).await {
                        Ok(body) => FetchState::Success { body, attempts: attempt },
                        Err(err) => {
                            if err.is_retryable() {
                                tracing::warn!(url = %url, attempt, error = %err, "attempt failed");
                            }
                            after_failure(err, attempt, max_attempts, self.config.backoff_base)
                        }
                    }
                }
                FetchState::Backoff { next_attempt, delay } => {
                    tracing::debug!(url = %url, ?delay, next_attempt, "backing off");
                    match wait_or_cancel(cancel, delay, url.as_str()).await {
                        Ok(()) => FetchState::Attempting { attempt: next_attempt },
                        Err(err) => FetchState::Terminal(err),
                    }
                }
                FetchState::Success { body, attempts } => return Ok((body, attempts)),
                FetchState::Terminal(err) => return Err(err),
            };
        }
    }

    /// One request/response exchange.
    async fn attempt(&self, cancel: &CancellationToken, url: &reqwest::Url, accept: AcceptKind) -> Result<Bytes, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(url.to_string()));
        }

        let request = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, accept.header_value())
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled(url.to_string())),
            result = request => result.map_err(|e| network_error(url, &e))?,
        };

        let status = response.status();
        if status != StatusCode::OK {
            let code = status.as_u16();
            return Err(Error::HttpStatus { url: url.to_string(), code, class: StatusClass::from_code(code) });
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled(url.to_string())),
            body = self.read_body(url, response) => body?,
        };

        check_body(url.as_str(), accept, &body)?;

        tracing::debug!(url = %url, bytes = body.len(), "response body read");
        Ok(body)
    }

    /// Read the whole body chunk by chunk, enforcing `max_bytes`.
    async fn read_body(&self, url: &reqwest::Url, mut response: Response) -> Result<Bytes, Error> {
        let limit = self.config.max_bytes;
        let declared = response.content_length().map(|len| len as usize);

        if let Some(len) = declared
            && len > limit
        {
            return Err(Error::FetchTooLarge { url: url.to_string(), size: len, limit });
        }

        let mut buf = BytesMut::with_capacity(declared.unwrap_or(INITIAL_BODY_CAPACITY));
        while let Some(chunk) = response.chunk().await.map_err(|e| network_error(url, &e))? {
            if buf.len() + chunk.len() > limit {
                return Err(Error::FetchTooLarge { url: url.to_string(), size: buf.len() + chunk.len(), limit });
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(buf.freeze())
    }

    /// Shared response cache.
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// JSON bodies must parse; every other kind is returned verbatim.
fn check_body(url: &str, accept: AcceptKind, body: &[u8]) -> Result<(), Error> {
    if accept == AcceptKind::Json {
        serde_json::from_slice::<serde::de::IgnoredAny>(body)
            .map_err(|e| Error::Decode { url: url.to_string(), message: e.to_string() })?;
    }
    Ok(())
}

fn network_error(url: &reqwest::Url, err: &reqwest::Error) -> Error {
    Error::Network { url: url.to_string(), attempts: 1, message: err.to_string() }
}
