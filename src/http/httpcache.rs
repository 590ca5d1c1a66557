//! The cache-wrapped transaction factory.
//!
//! Sits between jobs and the instrumented network factory. The backend is
//! created lazily, exactly once; if creation fails (the no-cache factory,
//! or a disk error) the cache stays disabled and every transaction goes
//! straight to the network. RFC 7234 freshness is honored via
//! Cache-Control max-age, with ETag/Last-Modified retained for
//! revalidation.

use crate::base::neterror::NetError;
use crate::http::backend::{BackendFactory, CacheBackend, CacheEntry, CacheKey};
use crate::http::session::{
    HttpTransaction, HttpTransactionFactory, InstrumentedTransactionFactory, TransactionStart,
};
use crate::urlrequest::job::JobResponse;
use crate::urlrequest::request::URLRequest;
use http::HeaderMap;
use std::sync::{Arc, OnceLock};
use time::{Duration, OffsetDateTime};

/// Parsed Cache-Control directives.
#[derive(Debug, Default)]
struct CacheControl {
    no_store: bool,
    no_cache: bool,
    max_age: Option<u64>,
}

fn parse_cache_control(headers: &HeaderMap) -> CacheControl {
    let mut parsed = CacheControl::default();
    let Some(value) = headers
        .get(http::header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
    else {
        return parsed;
    };

    for directive in value.split(',').map(str::trim) {
        let directive = directive.to_lowercase();
        if directive == "no-store" {
            parsed.no_store = true;
        } else if directive == "no-cache" {
            parsed.no_cache = true;
        } else if let Some(age) = directive.strip_prefix("max-age=") {
            parsed.max_age = age.parse().ok();
        }
    }
    parsed
}

/// Transaction factory wrapping the selected cache backend around the
/// instrumented network factory.
pub struct HttpCache {
    network: InstrumentedTransactionFactory,
    backend_factory: Box<dyn BackendFactory>,
    backend: OnceLock<Option<Box<dyn CacheBackend>>>,
}

impl HttpCache {
    pub fn new(
        network: InstrumentedTransactionFactory,
        backend_factory: Box<dyn BackendFactory>,
    ) -> Self {
        Self {
            network,
            backend_factory,
            backend: OnceLock::new(),
        }
    }

    /// The backend, created on first use. A refused creation disables
    /// caching for the lifetime of the context; it is never retried and
    /// never an error.
    fn backend(&self) -> Option<&dyn CacheBackend> {
        self.backend
            .get_or_init(|| match self.backend_factory.create_backend() {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::debug!(error = %e, "cache backend unavailable, requests go uncached");
                    None
                }
            })
            .as_deref()
    }

    /// Whether a backend is (or would be) available.
    pub fn caching_enabled(&self) -> bool {
        self.backend().is_some()
    }

    pub fn network(&self) -> &InstrumentedTransactionFactory {
        &self.network
    }

    pub fn create_transaction(self: &Arc<Self>) -> Box<dyn HttpTransaction> {
        Box::new(HttpCacheTransaction {
            cache: Arc::clone(self),
        })
    }
}

impl std::fmt::Debug for HttpCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCache")
            .field("backend_created", &self.backend.get().is_some())
            .finish()
    }
}

struct HttpCacheTransaction {
    cache: Arc<HttpCache>,
}

impl HttpTransaction for HttpCacheTransaction {
    fn start(self: Box<Self>, request: URLRequest) -> TransactionStart {
        Box::pin(async move {
            let cache = self.cache;
            let method = request.method().as_str().to_uppercase();
            let cacheable_method = method == "GET" || method == "HEAD";
            let key = CacheKey::new(request.url(), &method);

            if cacheable_method {
                if let Some(backend) = cache.backend() {
                    match backend.get(&key) {
                        Ok(Some(entry)) if entry.is_fresh() => {
                            tracing::debug!(url = %request.url(), "serving from cache");
                            return Ok(JobResponse {
                                status: entry.status,
                                headers: entry.headers,
                                body: entry.body,
                            });
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(error = %e, "cache read error, going to network");
                        }
                    }
                }
            }

            let response = cache.network.create_transaction().start(request).await?;

            if cacheable_method && response.status.is_success() {
                if let Some(backend) = cache.backend() {
                    let control = parse_cache_control(&response.headers);
                    if !control.no_store {
                        let entry = CacheEntry {
                            status: response.status,
                            headers: response.headers.clone(),
                            body: response.body.clone(),
                            cached_at: OffsetDateTime::now_utc(),
                            ttl: control
                                .max_age
                                .filter(|_| !control.no_cache)
                                .map(|secs| Duration::seconds(secs as i64)),
                            etag: header_string(&response.headers, http::header::ETAG),
                            last_modified: header_string(
                                &response.headers,
                                http::header::LAST_MODIFIED,
                            ),
                        };
                        if let Err(e) = backend.put(key, entry) {
                            tracing::debug!(error = %e, "cache store failed");
                        }
                    }
                }
            }

            Ok(response)
        })
    }
}

fn header_string(headers: &HeaderMap, name: http::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
