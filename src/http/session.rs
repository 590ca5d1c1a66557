//! The network session: shared parameters plus the components every
//! transaction consults.
//!
//! The session owns nothing exclusively; it borrows (via `Arc`) the
//! resolver, security state, proxy service, and auth factory that the
//! served context assembled, mirroring how Chromium threads its context
//! components into `HttpNetworkSession`.

use crate::base::neterror::NetError;
use crate::dns::{HostMappingRules, Name, Resolve};
use crate::http::auth::HttpAuthHandlerFactory;
use crate::http::serverproperties::HttpServerProperties;
use crate::profile::NetworkDelegate;
use crate::proxy::ProxyResolutionService;
use crate::tls::{CertVerifier, CtPolicyEnforcer, MultiLogCtVerifier, SslConfigService, TransportSecurityState};
use crate::urlrequest::job::JobResponse;
use crate::urlrequest::request::URLRequest;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Tunables applied to every connection the session makes.
#[derive(Debug, Clone)]
pub struct HttpNetworkSessionParams {
    pub enable_http2: bool,
    pub ignore_certificate_errors: bool,
    pub host_mapping_rules: HostMappingRules,
}

impl Default for HttpNetworkSessionParams {
    fn default() -> Self {
        Self {
            enable_http2: true,
            ignore_certificate_errors: false,
            host_mapping_rules: HostMappingRules::new(),
        }
    }
}

/// Context components the session consults per transaction.
pub struct HttpNetworkSessionContext {
    pub host_resolver: Arc<dyn Resolve>,
    pub cert_verifier: Arc<CertVerifier>,
    pub transport_security_state: Arc<TransportSecurityState>,
    pub ct_verifier: Arc<MultiLogCtVerifier>,
    pub ct_policy_enforcer: Arc<CtPolicyEnforcer>,
    pub proxy_resolution_service: Arc<ProxyResolutionService>,
    pub http_auth_handler_factory: Arc<HttpAuthHandlerFactory>,
    pub http_server_properties: Arc<HttpServerProperties>,
    pub ssl_config_service: Arc<SslConfigService>,
}

/// One session per served context.
pub struct HttpNetworkSession {
    params: HttpNetworkSessionParams,
    context: HttpNetworkSessionContext,
}

impl HttpNetworkSession {
    pub fn new(params: HttpNetworkSessionParams, context: HttpNetworkSessionContext) -> Self {
        Self { params, context }
    }

    pub fn params(&self) -> &HttpNetworkSessionParams {
        &self.params
    }

    pub fn context(&self) -> &HttpNetworkSessionContext {
        &self.context
    }

    pub fn create_transaction(self: &Arc<Self>) -> Box<dyn HttpTransaction> {
        Box::new(HttpNetworkTransaction {
            session: Arc::clone(self),
        })
    }
}

impl std::fmt::Debug for HttpNetworkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNetworkSession")
            .field("params", &self.params)
            .finish()
    }
}

/// Future returned by [`HttpTransaction::start`].
pub type TransactionStart = BoxFuture<'static, Result<JobResponse, NetError>>;

/// One request flowing toward the transport.
pub trait HttpTransaction: Send {
    fn start(self: Box<Self>, request: URLRequest) -> TransactionStart;
}

/// Creates transactions; implemented by the cache wrapper and the
/// instrumented factory below.
pub trait HttpTransactionFactory: Send + Sync {
    fn create_transaction(&self) -> Box<dyn HttpTransaction>;
}

/// A transaction headed for the wire.
///
/// Performs the context-owned steps (host mapping, resolution, proxy
/// selection, HSTS consultation); the wire I/O itself belongs to the
/// transport layer outside this crate, so starting ends with
/// [`NetError::NotImplemented`] once those steps succeed.
struct HttpNetworkTransaction {
    session: Arc<HttpNetworkSession>,
}

impl HttpTransaction for HttpNetworkTransaction {
    fn start(self: Box<Self>, request: URLRequest) -> TransactionStart {
        Box::pin(async move {
            let session = self.session;
            let url = request.url();
            let host = url.host_str().ok_or(NetError::InvalidUrl)?.to_string();

            let mapped_host = match session.params.host_mapping_rules.rewrite(&host) {
                Some((replacement, _port)) => replacement,
                None => host.clone(),
            };

            if url.scheme() == "http"
                && session
                    .context
                    .transport_security_state
                    .should_upgrade(&mapped_host)
            {
                tracing::debug!(host = %mapped_host, "HSTS requires https for this host");
            }

            // Mandatory PAC failures surface here rather than silently
            // falling back to direct.
            let _proxy = session
                .context
                .proxy_resolution_service
                .resolve_proxy(url)?;

            let _addrs = session
                .context
                .host_resolver
                .resolve(Name::new(mapped_host))
                .await?;

            Err(NetError::NotImplemented)
        })
    }
}

/// Transaction factory that wraps every network transaction with the
/// context's instrumentation hooks.
pub struct InstrumentedTransactionFactory {
    session: Arc<HttpNetworkSession>,
    delegate: Arc<dyn NetworkDelegate>,
}

impl InstrumentedTransactionFactory {
    pub fn new(session: Arc<HttpNetworkSession>, delegate: Arc<dyn NetworkDelegate>) -> Self {
        Self { session, delegate }
    }

    pub fn session(&self) -> &Arc<HttpNetworkSession> {
        &self.session
    }
}

impl HttpTransactionFactory for InstrumentedTransactionFactory {
    fn create_transaction(&self) -> Box<dyn HttpTransaction> {
        Box::new(InstrumentedTransaction {
            inner: self.session.create_transaction(),
            delegate: Arc::clone(&self.delegate),
        })
    }
}

struct InstrumentedTransaction {
    inner: Box<dyn HttpTransaction>,
    delegate: Arc<dyn NetworkDelegate>,
}

impl HttpTransaction for InstrumentedTransaction {
    fn start(self: Box<Self>, request: URLRequest) -> TransactionStart {
        let delegate = self.delegate;
        let inner = self.inner;
        Box::pin(async move {
            delegate.on_before_request(&request);
            let result = inner.start(request.clone()).await;
            delegate.on_completed(&request, &result.as_ref().map(|_| ()).map_err(Clone::clone));
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = HttpNetworkSessionParams::default();
        assert!(params.enable_http2);
        assert!(!params.ignore_certificate_errors);
        assert!(params.host_mapping_rules.is_empty());
    }
}
