//! The context factory: captures configuration on the control context,
//! builds the served context once on the build context.
//!
//! Construction is two-phase. The factory is created on the control
//! context, where it snapshots its parameters and the control-only
//! resources (the system proxy configuration source). The object graph is
//! materialized later, on first use, on the build context; the single
//! cross-context path afterwards is the cookie-change redispatch, guarded
//! by a weak token the destructor invalidates before anything else is
//! freed.

use crate::base::commandline::CommandLine;
use crate::base::taskrunner::SingleThreadTaskRunner;
use crate::base::weak::WeakFactory;
use crate::cookies::{
    CookieChangeSubscription, CookieDetails, CookieMonster, SqlitePersistentCookieStore,
};
use crate::dns::{HickoryResolver, MappedHostResolver, Resolve};
use crate::http::{
    BackendFactory, DiskBackendFactory, HttpAuthHandlerFactory, HttpAuthPreferences, HttpCache,
    HttpNetworkSession, HttpNetworkSessionContext, HttpNetworkSessionParams, HttpServerProperties,
    InMemoryBackendFactory, InstrumentedTransactionFactory, NoCacheBackendFactory,
    StaticHttpUserAgentSettings,
};
use crate::profile::{NetworkDelegate, PassThroughNetworkDelegate, Profile};
use crate::protocol::{
    AboutProtocolHandler, ArchiveReader, DataProtocolHandler, FileProtocolHandler,
    FtpProtocolHandler, HttpProtocolHandler,
};
use crate::proxy::{ProxyResolutionService, SystemProxyConfigSource};
use crate::switches;
use crate::tls::{
    create_log_verifiers_for_known_logs, CertVerifier, CtPolicyEnforcer, DefaultRequireCtDelegate,
    MultiLogCtVerifier, RequireCtDelegate, SslConfigService, TransportSecurityState,
};
use crate::urlrequest::context::URLRequestContext;
use crate::urlrequest::interceptor::{wrap_with_interceptors, URLRequestInterceptor};
use crate::urlrequest::job::ProtocolHandler;
use crate::urlrequest::jobfactory::URLRequestJobFactory;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, Weak};

/// The configuration snapshot captured at factory construction.
///
/// `protocol_handlers` and `request_interceptors` transfer ownership into
/// the build; both are drained exactly once and are empty afterwards.
pub struct RequestContextParams {
    pub base_path: PathBuf,
    pub in_memory: bool,
    pub use_cache: bool,
    pub user_agent: String,
    pub accept_language: String,
    /// Schemes allowed to carry cookies; empty keeps the engine default
    /// (network schemes only).
    pub cookieable_schemes: Vec<String>,
    pub protocol_handlers: HashMap<String, Box<dyn ProtocolHandler>>,
    pub request_interceptors: Vec<Box<dyn URLRequestInterceptor>>,
    /// Capability for serving entries out of packed archives via `file:`.
    pub archive_reader: Option<Arc<dyn ArchiveReader>>,
}

impl RequestContextParams {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            in_memory: false,
            use_cache: true,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            accept_language: "en-US,en;q=0.9".to_string(),
            cookieable_schemes: Vec::new(),
            protocol_handlers: HashMap::new(),
            request_interceptors: Vec::new(),
            archive_reader: None,
        }
    }
}

impl std::fmt::Debug for RequestContextParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContextParams")
            .field("base_path", &self.base_path)
            .field("in_memory", &self.in_memory)
            .field("use_cache", &self.use_cache)
            .field("handlers", &self.protocol_handlers.len())
            .field("interceptors", &self.request_interceptors.len())
            .finish()
    }
}

/// Builds and owns one profile's served context.
pub struct RequestContextFactory {
    command_line: Arc<CommandLine>,
    control_runner: SingleThreadTaskRunner,
    build_runner: SingleThreadTaskRunner,
    profile: Weak<dyn Profile>,
    // Captured on the control context, consumed once during build.
    params: Mutex<Option<RequestContextParams>>,
    proxy_config_source: Mutex<Option<SystemProxyConfigSource>>,
    weak_factory: WeakFactory,
    context: OnceLock<URLRequestContext>,
    cookie_change_sub: OnceLock<CookieChangeSubscription>,
}

impl RequestContextFactory {
    /// Capture the configuration snapshot. Runs on the control context;
    /// the system proxy configuration source is read here because it is
    /// not legal to read it on the build context.
    pub fn new(
        params: RequestContextParams,
        profile: Weak<dyn Profile>,
        command_line: Arc<CommandLine>,
        control_runner: SingleThreadTaskRunner,
        build_runner: SingleThreadTaskRunner,
    ) -> Arc<Self> {
        debug_assert!(
            control_runner.belongs_to_current_thread(),
            "factory must be constructed on the control context"
        );

        let proxy_config_source = SystemProxyConfigSource::capture();

        Arc::new(Self {
            command_line,
            control_runner,
            build_runner,
            profile,
            params: Mutex::new(Some(params)),
            proxy_config_source: Mutex::new(Some(proxy_config_source)),
            weak_factory: WeakFactory::new(),
            context: OnceLock::new(),
            cookie_change_sub: OnceLock::new(),
        })
    }

    /// The served context, materialized on first call.
    ///
    /// Must run on the build context; subsequent calls return the same
    /// context and never rebuild.
    pub fn url_request_context(&self) -> &URLRequestContext {
        debug_assert!(
            self.build_runner.belongs_to_current_thread(),
            "the context is built and served on the build context"
        );
        self.context.get_or_init(|| self.create())
    }

    pub fn control_runner(&self) -> &SingleThreadTaskRunner {
        &self.control_runner
    }

    pub fn build_runner(&self) -> &SingleThreadTaskRunner {
        &self.build_runner
    }

    /// One linear pass, each step depending only on earlier ones.
    fn create(&self) -> URLRequestContext {
        let mut params = self
            .params
            .lock()
            .expect("params poisoned")
            .take()
            .expect("served context built twice");
        let command_line = Arc::clone(&self.command_line);

        tracing::debug!(path = %params.base_path.display(), in_memory = params.in_memory,
            "building request context");

        // Security subsystem: one CT delegate shared by the transport
        // security state and the certificate verifier.
        let ct_delegate: Arc<dyn RequireCtDelegate> = Arc::new(DefaultRequireCtDelegate);
        let mut transport_security_state = TransportSecurityState::with_preload();
        transport_security_state.set_require_ct_delegate(Arc::clone(&ct_delegate));
        let transport_security_state = Arc::new(transport_security_state);
        let cert_verifier = Arc::new(CertVerifier::new(Arc::clone(&ct_delegate)));
        let ct_verifier = MultiLogCtVerifier::new();
        ct_verifier.add_logs(create_log_verifiers_for_known_logs());
        let ct_verifier = Arc::new(ct_verifier);
        let ct_policy_enforcer = Arc::new(CtPolicyEnforcer::new());
        let ssl_config_service = Arc::new(SslConfigService::default());

        // Host resolver, optionally wrapped with remap rules.
        let mut host_resolver: Arc<dyn Resolve> = Arc::new(HickoryResolver::new());
        if command_line.has_switch(switches::HOST_RESOLVER_RULES) {
            let mut mapped = MappedHostResolver::new(host_resolver);
            mapped.set_rules_from_string(command_line.switch_value(switches::HOST_RESOLVER_RULES));
            host_resolver = Arc::new(mapped);
        }

        // Proxy resolution, consuming the source captured on the control
        // context.
        let proxy_config_source = self
            .proxy_config_source
            .lock()
            .expect("proxy source poisoned")
            .take()
            .unwrap_or_default();
        let proxy_resolution_service = Arc::new(ProxyResolutionService::from_command_line(
            &command_line,
            proxy_config_source,
        ));

        // Auth handler factory; needs the resolver.
        let mut auth_preferences = HttpAuthPreferences::new();
        if command_line.has_switch(switches::AUTH_SERVER_ALLOWLIST) {
            auth_preferences
                .set_server_allowlist(command_line.switch_value(switches::AUTH_SERVER_ALLOWLIST));
        }
        if command_line.has_switch(switches::AUTH_NEGOTIATE_DELEGATE_ALLOWLIST) {
            auth_preferences.set_delegate_allowlist(
                command_line.switch_value(switches::AUTH_NEGOTIATE_DELEGATE_ALLOWLIST),
            );
        }
        let http_auth_handler_factory = Arc::new(HttpAuthHandlerFactory::new(
            Arc::new(auth_preferences),
            Arc::clone(&host_resolver),
        ));

        // Cookie subsystem.
        let cookie_store = self.create_cookie_store(&params);
        if !params.cookieable_schemes.is_empty() {
            cookie_store.set_cookieable_schemes(std::mem::take(&mut params.cookieable_schemes));
        }
        self.install_cookie_change_forwarder(&cookie_store);

        let http_user_agent_settings = StaticHttpUserAgentSettings::new(
            params.accept_language.clone(),
            params.user_agent.clone(),
        );
        let http_server_properties = Arc::new(HttpServerProperties::new());

        // Network session parameters.
        let mut session_params = HttpNetworkSessionParams::default();
        if command_line.has_switch(switches::DISABLE_HTTP2) {
            session_params.enable_http2 = false;
        }
        if command_line.has_switch(switches::IGNORE_CERTIFICATE_ERRORS) {
            session_params.ignore_certificate_errors = true;
        }
        if command_line.has_switch(switches::HOST_RULES) {
            session_params
                .host_mapping_rules
                .set_rules_from_string(command_line.switch_value(switches::HOST_RULES));
        }

        let session = Arc::new(HttpNetworkSession::new(
            session_params,
            HttpNetworkSessionContext {
                host_resolver: Arc::clone(&host_resolver),
                cert_verifier: Arc::clone(&cert_verifier),
                transport_security_state: Arc::clone(&transport_security_state),
                ct_verifier: Arc::clone(&ct_verifier),
                ct_policy_enforcer: Arc::clone(&ct_policy_enforcer),
                proxy_resolution_service: Arc::clone(&proxy_resolution_service),
                http_auth_handler_factory: Arc::clone(&http_auth_handler_factory),
                http_server_properties: Arc::clone(&http_server_properties),
                ssl_config_service: Arc::clone(&ssl_config_service),
            },
        ));

        // Cache-wrapped transaction factory over the selected backend.
        let network_delegate: Arc<dyn NetworkDelegate> = Arc::new(PassThroughNetworkDelegate);
        let backend_factory = Self::select_backend_factory(&params, &command_line);
        let http_transaction_factory = Arc::new(HttpCache::new(
            InstrumentedTransactionFactory::new(
                Arc::clone(&session),
                Arc::clone(&network_delegate),
            ),
            backend_factory,
        ));

        // Scheme dispatch table: embedder handlers first, then built-ins
        // for whatever is left unclaimed.
        let mut job_factory = URLRequestJobFactory::new();
        for (scheme, handler) in params.protocol_handlers.drain() {
            job_factory.set_protocol_handler(&scheme, handler);
        }
        job_factory.set_protocol_handler("about", Box::new(AboutProtocolHandler::new()));
        job_factory.set_protocol_handler("data", Box::new(DataProtocolHandler::new()));
        let file_handler = match params.archive_reader.take() {
            Some(reader) => FileProtocolHandler::with_archive_reader(reader),
            None => FileProtocolHandler::new(),
        };
        job_factory.set_protocol_handler("file", Box::new(file_handler));
        for scheme in ["http", "https", "ws", "wss"] {
            job_factory.set_protocol_handler(
                scheme,
                Box::new(HttpProtocolHandler::new(
                    scheme,
                    Arc::clone(&http_transaction_factory),
                )),
            );
        }
        job_factory.set_protocol_handler(
            "ftp",
            Box::new(FtpProtocolHandler::new(Arc::clone(&host_resolver))),
        );

        // Interceptors wrap in reverse registration order, leaving the
        // first registered outermost.
        let interceptors = std::mem::take(&mut params.request_interceptors);
        let job_factory = wrap_with_interceptors(Box::new(job_factory), interceptors);

        URLRequestContext {
            cookie_store,
            transport_security_state,
            cert_verifier,
            ct_verifier,
            ct_policy_enforcer,
            ssl_config_service,
            host_resolver,
            proxy_resolution_service,
            http_auth_handler_factory,
            http_server_properties,
            http_user_agent_settings,
            network_delegate,
            http_transaction_factory,
            job_factory,
        }
    }

    fn create_cookie_store(&self, params: &RequestContextParams) -> Arc<CookieMonster> {
        if params.in_memory {
            return Arc::new(CookieMonster::new());
        }

        let cookie_path = params.base_path.join("Cookies");
        match SqlitePersistentCookieStore::open(&cookie_path) {
            Ok(store) => Arc::new(CookieMonster::with_persistent_store(Arc::new(store))),
            Err(e) => {
                // Storage trouble degrades to a memory-backed jar.
                tracing::warn!(path = %cookie_path.display(), error = %e,
                    "cookie store unavailable, using in-memory jar");
                Arc::new(CookieMonster::new())
            }
        }
    }

    /// Subscribe to the store and forward every change to the profile on
    /// the control context. The weak token turns posts that arrive after
    /// teardown into no-ops.
    fn install_cookie_change_forwarder(&self, cookie_store: &Arc<CookieMonster>) {
        let control_runner = self.control_runner.clone();
        let weak = self.weak_factory.weak_ref();
        let profile = self.profile.clone();

        let subscription =
            cookie_store
                .change_dispatcher()
                .add_callback_for_all_changes(move |cookie, cause| {
                    let cookie = cookie.clone();
                    let weak = weak.clone();
                    let profile = profile.clone();
                    control_runner.post_task(move || {
                        if !weak.is_valid() {
                            return;
                        }
                        if let Some(profile) = profile.upgrade() {
                            profile.notify_cookie_change(&CookieDetails::new(cookie, cause));
                        }
                    });
                });

        let _ = self.cookie_change_sub.set(subscription);
    }

    fn select_backend_factory(
        params: &RequestContextParams,
        command_line: &CommandLine,
    ) -> Box<dyn BackendFactory> {
        if params.in_memory {
            return Box::new(InMemoryBackendFactory::new(0));
        }
        if !params.use_cache || command_line.has_switch(switches::DISABLE_HTTP_CACHE) {
            return Box::new(NoCacheBackendFactory);
        }

        let max_size = command_line
            .switch_value(switches::DISK_CACHE_SIZE)
            .parse()
            .unwrap_or(0);
        Box::new(DiskBackendFactory::new(
            params.base_path.join("Cache"),
            max_size,
        ))
    }
}

impl Drop for RequestContextFactory {
    fn drop(&mut self) {
        // Invalidate before any owned state is freed so an in-flight
        // redispatch either sees a live factory or skips entirely.
        self.weak_factory.invalidate_all();
    }
}

impl std::fmt::Debug for RequestContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContextFactory")
            .field("built", &self.context.get().is_some())
            .finish()
    }
}
