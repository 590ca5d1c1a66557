//! The network transport handler family.
//!
//! One handler type covers `http`, `https`, `ws`, and `wss`; the context
//! builder registers four instances, each parameterized by its scheme.
//! Jobs route through the cache-wrapped transaction factory, which in turn
//! reaches the instrumented network session.

use crate::base::neterror::NetError;
use crate::http::HttpCache;
use crate::urlrequest::job::{JobStart, ProtocolHandler, URLRequestJob};
use crate::urlrequest::request::URLRequest;
use std::sync::Arc;

pub struct HttpProtocolHandler {
    scheme: &'static str,
    cache: Arc<HttpCache>,
}

impl HttpProtocolHandler {
    pub fn new(scheme: &'static str, cache: Arc<HttpCache>) -> Self {
        Self { scheme, cache }
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }
}

impl ProtocolHandler for HttpProtocolHandler {
    fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        if request.scheme() != self.scheme {
            return Err(NetError::DisallowedUrlScheme);
        }
        Ok(Box::new(HttpJob {
            request: request.clone(),
            cache: Arc::clone(&self.cache),
        }))
    }
}

struct HttpJob {
    request: URLRequest,
    cache: Arc<HttpCache>,
}

impl URLRequestJob for HttpJob {
    fn start(self: Box<Self>) -> JobStart {
        let transaction = self.cache.create_transaction();
        transaction.start(self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::backend::NoCacheBackendFactory;
    use crate::http::session::{
        HttpNetworkSession, HttpNetworkSessionContext, HttpNetworkSessionParams,
        InstrumentedTransactionFactory,
    };
    use crate::http::{HttpAuthHandlerFactory, HttpAuthPreferences, HttpServerProperties};
    use crate::dns::GaiResolver;
    use crate::profile::PassThroughNetworkDelegate;
    use crate::proxy::ProxyResolutionService;
    use crate::tls::{
        CertVerifier, CtPolicyEnforcer, DefaultRequireCtDelegate, MultiLogCtVerifier,
        SslConfigService, TransportSecurityState,
    };

    fn test_cache() -> Arc<HttpCache> {
        let resolver: Arc<dyn crate::dns::Resolve> = Arc::new(GaiResolver::new());
        let delegate = Arc::new(DefaultRequireCtDelegate);
        let context = HttpNetworkSessionContext {
            host_resolver: Arc::clone(&resolver),
            cert_verifier: Arc::new(CertVerifier::new(delegate.clone())),
            transport_security_state: Arc::new(TransportSecurityState::new()),
            ct_verifier: Arc::new(MultiLogCtVerifier::new()),
            ct_policy_enforcer: Arc::new(CtPolicyEnforcer::new()),
            proxy_resolution_service: Arc::new(ProxyResolutionService::create_direct()),
            http_auth_handler_factory: Arc::new(HttpAuthHandlerFactory::new(
                Arc::new(HttpAuthPreferences::new()),
                resolver,
            )),
            http_server_properties: Arc::new(HttpServerProperties::new()),
            ssl_config_service: Arc::new(SslConfigService::default()),
        };
        let session = Arc::new(HttpNetworkSession::new(
            HttpNetworkSessionParams::default(),
            context,
        ));
        Arc::new(HttpCache::new(
            InstrumentedTransactionFactory::new(session, Arc::new(PassThroughNetworkDelegate)),
            Box::new(NoCacheBackendFactory),
        ))
    }

    #[test]
    fn test_scheme_mismatch_rejected() {
        let handler = HttpProtocolHandler::new("https", test_cache());
        let request = URLRequest::new("http://example.com/").unwrap();
        assert_eq!(
            handler.create_job(&request).err().unwrap(),
            NetError::DisallowedUrlScheme
        );
    }

    #[test]
    fn test_matching_scheme_creates_job() {
        let handler = HttpProtocolHandler::new("http", test_cache());
        let request = URLRequest::new("http://example.com/").unwrap();
        assert!(handler.create_job(&request).is_ok());
    }
}
