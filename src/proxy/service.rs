//! Proxy resolution service and its selection logic.
//!
//! The service is chosen once per context by priority: an explicit
//! "no proxy" directive wins over a fixed server list, which wins over a
//! PAC URL, which wins over system-derived configuration. The system
//! configuration source must be read on the control context, so it is
//! captured eagerly at factory construction and consumed lazily at build.

use super::config::{ProxyConfig, ProxyServer};
use crate::base::commandline::CommandLine;
use crate::base::neterror::NetError;
use crate::switches;
use url::Url;

/// Proxy configuration captured from the platform.
///
/// Reading the platform configuration is only legal on the control
/// context (on some platforms it must run on the UI event loop), while the
/// resolution service that consumes it is built later on the build context.
/// [`SystemProxyConfigSource::capture`] therefore runs eagerly at factory
/// construction and the captured value moves into the service by ownership.
#[derive(Debug, Clone, Default)]
pub struct SystemProxyConfigSource {
    config: ProxyConfig,
}

impl SystemProxyConfigSource {
    /// Capture the platform proxy configuration from the environment.
    ///
    /// Checks `HTTPS_PROXY`/`HTTP_PROXY` (either case) and `NO_PROXY`.
    pub fn capture() -> Self {
        let server = std::env::var("HTTPS_PROXY")
            .or_else(|_| std::env::var("https_proxy"))
            .or_else(|_| std::env::var("HTTP_PROXY"))
            .or_else(|_| std::env::var("http_proxy"))
            .unwrap_or_default();
        let bypass = std::env::var("NO_PROXY")
            .or_else(|_| std::env::var("no_proxy"))
            .unwrap_or_default();

        Self {
            config: ProxyConfig::from_rules(&server, &bypass),
        }
    }

    /// An empty source, resolving everything direct.
    pub fn empty() -> Self {
        Self::default()
    }

    fn into_config(self) -> ProxyConfig {
        self.config
    }
}

/// How the service was configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyResolutionKind {
    /// Every request connects directly.
    Direct,
    /// Fixed rules or PAC URL from explicit configuration.
    Fixed,
    /// Configuration captured from the platform.
    System,
}

/// Outcome of resolving a proxy for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedProxy {
    Direct,
    Proxy(ProxyServer),
}

/// Per-context proxy resolution.
pub struct ProxyResolutionService {
    kind: ProxyResolutionKind,
    config: ProxyConfig,
}

impl ProxyResolutionService {
    /// Service that resolves everything direct.
    pub fn create_direct() -> Self {
        Self {
            kind: ProxyResolutionKind::Direct,
            config: ProxyConfig::default(),
        }
    }

    /// Service with a fixed configuration (rules or PAC URL).
    pub fn create_fixed(config: ProxyConfig) -> Self {
        Self {
            kind: ProxyResolutionKind::Fixed,
            config,
        }
    }

    /// Service consuming a previously captured system configuration.
    pub fn create_using_system_source(source: SystemProxyConfigSource) -> Self {
        Self {
            kind: ProxyResolutionKind::System,
            config: source.into_config(),
        }
    }

    /// Select and build the service for one context, by priority.
    ///
    /// 1. `no-proxy-server` -> direct, even when other proxy switches are set
    /// 2. `proxy-server` (+ `proxy-bypass-list`) -> fixed
    /// 3. `proxy-pac-url` -> fixed, PAC mandatory
    /// 4. otherwise -> the captured system configuration
    pub fn from_command_line(
        command_line: &CommandLine,
        system_source: SystemProxyConfigSource,
    ) -> Self {
        if command_line.has_switch(switches::NO_PROXY_SERVER) {
            return Self::create_direct();
        }

        if command_line.has_switch(switches::PROXY_SERVER) {
            let config = ProxyConfig::from_rules(
                command_line.switch_value(switches::PROXY_SERVER),
                command_line.switch_value(switches::PROXY_BYPASS_LIST),
            );
            return Self::create_fixed(config);
        }

        if command_line.has_switch(switches::PROXY_PAC_URL) {
            let raw = command_line.switch_value(switches::PROXY_PAC_URL);
            match Url::parse(raw) {
                Ok(pac_url) => {
                    let mut config = ProxyConfig::from_pac_url(pac_url);
                    config.set_pac_mandatory(true);
                    return Self::create_fixed(config);
                }
                Err(e) => {
                    // Unparsable PAC URL degrades to the empty fixed config.
                    tracing::warn!(url = %raw, error = %e, "ignoring malformed PAC URL");
                    return Self::create_fixed(ProxyConfig::default());
                }
            }
        }

        Self::create_using_system_source(system_source)
    }

    /// Resolve the proxy to use for `url`.
    ///
    /// PAC evaluation happens outside this crate; a mandatory PAC
    /// configuration therefore refuses to fall back to direct, while a
    /// non-mandatory one degrades to direct resolution.
    pub fn resolve_proxy(&self, url: &Url) -> Result<ResolvedProxy, NetError> {
        if self.kind == ProxyResolutionKind::Direct {
            return Ok(ResolvedProxy::Direct);
        }

        if self.config.bypass.matches_url(url) {
            return Ok(ResolvedProxy::Direct);
        }

        if let Some(pac_url) = self.config.pac_url() {
            if self.config.pac_mandatory() {
                tracing::debug!(pac = %pac_url, "mandatory PAC resolution unavailable");
                return Err(NetError::MandatoryProxyConfigurationFailed);
            }
            tracing::debug!(pac = %pac_url, "PAC resolution unavailable, using direct");
            return Ok(ResolvedProxy::Direct);
        }

        Ok(match self.config.rules.proxy_for_url(url) {
            Some(server) => ResolvedProxy::Proxy(server.clone()),
            None => ResolvedProxy::Direct,
        })
    }

    pub fn kind(&self) -> ProxyResolutionKind {
        self.kind
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn is_direct(&self) -> bool {
        self.kind == ProxyResolutionKind::Direct
    }
}

impl std::fmt::Debug for ProxyResolutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResolutionService")
            .field("kind", &self.kind)
            .field("pac_mandatory", &self.config.pac_mandatory())
            .finish()
    }
}
