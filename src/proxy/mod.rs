//! Proxy configuration and resolution.

pub mod config;
pub mod matcher;
pub mod service;

pub use config::{ProxyConfig, ProxyRules, ProxyServer, ProxyType};
pub use matcher::ProxyBypassRules;
pub use service::{
    ProxyResolutionKind, ProxyResolutionService, ResolvedProxy, SystemProxyConfigSource,
};
