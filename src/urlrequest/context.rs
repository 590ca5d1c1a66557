//! The served context: the immutable object graph requests run against.
//!
//! Built at most once per profile by the context factory and never
//! rebuilt. The context is the sole owner of every component; request
//! handling code only ever borrows.

use crate::cookies::CookieMonster;
use crate::dns::Resolve;
use crate::http::{
    HttpAuthHandlerFactory, HttpCache, HttpServerProperties, StaticHttpUserAgentSettings,
};
use crate::profile::NetworkDelegate;
use crate::proxy::ProxyResolutionService;
use crate::tls::{
    CertVerifier, CtPolicyEnforcer, MultiLogCtVerifier, SslConfigService, TransportSecurityState,
};
use crate::urlrequest::job::URLRequestJob;
use crate::urlrequest::jobfactory::JobFactory;
use crate::urlrequest::request::URLRequest;
use crate::base::neterror::NetError;
use std::sync::Arc;

/// Everything a request needs, wired together once.
pub struct URLRequestContext {
    pub(crate) cookie_store: Arc<CookieMonster>,
    pub(crate) transport_security_state: Arc<TransportSecurityState>,
    pub(crate) cert_verifier: Arc<CertVerifier>,
    pub(crate) ct_verifier: Arc<MultiLogCtVerifier>,
    pub(crate) ct_policy_enforcer: Arc<CtPolicyEnforcer>,
    pub(crate) ssl_config_service: Arc<SslConfigService>,
    pub(crate) host_resolver: Arc<dyn Resolve>,
    pub(crate) proxy_resolution_service: Arc<ProxyResolutionService>,
    pub(crate) http_auth_handler_factory: Arc<HttpAuthHandlerFactory>,
    pub(crate) http_server_properties: Arc<HttpServerProperties>,
    pub(crate) http_user_agent_settings: StaticHttpUserAgentSettings,
    pub(crate) network_delegate: Arc<dyn NetworkDelegate>,
    pub(crate) http_transaction_factory: Arc<HttpCache>,
    pub(crate) job_factory: Box<dyn JobFactory>,
}

impl URLRequestContext {
    /// Dispatch one request through the interceptor-wrapped scheme table.
    pub fn create_job(&self, request: &URLRequest) -> Result<Box<dyn URLRequestJob>, NetError> {
        self.job_factory.create_job(request)
    }

    /// Whether any handler (built-in or embedder-supplied) serves `scheme`.
    pub fn is_handled_protocol(&self, scheme: &str) -> bool {
        self.job_factory.is_handled_protocol(scheme)
    }

    pub fn cookie_store(&self) -> &Arc<CookieMonster> {
        &self.cookie_store
    }

    pub fn transport_security_state(&self) -> &Arc<TransportSecurityState> {
        &self.transport_security_state
    }

    pub fn cert_verifier(&self) -> &Arc<CertVerifier> {
        &self.cert_verifier
    }

    pub fn ct_verifier(&self) -> &Arc<MultiLogCtVerifier> {
        &self.ct_verifier
    }

    pub fn ct_policy_enforcer(&self) -> &Arc<CtPolicyEnforcer> {
        &self.ct_policy_enforcer
    }

    pub fn ssl_config_service(&self) -> &Arc<SslConfigService> {
        &self.ssl_config_service
    }

    pub fn host_resolver(&self) -> &Arc<dyn Resolve> {
        &self.host_resolver
    }

    pub fn proxy_resolution_service(&self) -> &Arc<ProxyResolutionService> {
        &self.proxy_resolution_service
    }

    pub fn http_auth_handler_factory(&self) -> &Arc<HttpAuthHandlerFactory> {
        &self.http_auth_handler_factory
    }

    pub fn http_server_properties(&self) -> &Arc<HttpServerProperties> {
        &self.http_server_properties
    }

    pub fn http_user_agent_settings(&self) -> &StaticHttpUserAgentSettings {
        &self.http_user_agent_settings
    }

    pub fn network_delegate(&self) -> &Arc<dyn NetworkDelegate> {
        &self.network_delegate
    }

    pub fn http_transaction_factory(&self) -> &Arc<HttpCache> {
        &self.http_transaction_factory
    }
}

impl std::fmt::Debug for URLRequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("URLRequestContext")
            .field("cookie_store", &self.cookie_store)
            .field("proxy", &self.proxy_resolution_service)
            .field("transaction_factory", &self.http_transaction_factory)
            .finish()
    }
}
