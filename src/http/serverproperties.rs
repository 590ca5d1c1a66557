//! In-memory per-server knowledge and static user-agent settings.

use dashmap::DashMap;

/// Accumulated per-server facts (HTTP/2 support, broken alternatives).
///
/// In-memory only; the context never persists this between runs.
#[derive(Debug, Default)]
pub struct HttpServerProperties {
    supports_http2: DashMap<String, bool>,
}

impl HttpServerProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether `origin` (scheme://host:port) spoke HTTP/2.
    pub fn set_supports_http2(&self, origin: &str, supports: bool) {
        self.supports_http2.insert(origin.to_lowercase(), supports);
    }

    /// Last observed HTTP/2 support for `origin`, if any.
    pub fn supports_http2(&self, origin: &str) -> Option<bool> {
        self.supports_http2
            .get(&origin.to_lowercase())
            .map(|v| *v.value())
    }

    pub fn clear(&self) {
        self.supports_http2.clear();
    }
}

/// The user-agent and accept-language values served with every request.
#[derive(Debug, Clone)]
pub struct StaticHttpUserAgentSettings {
    accept_language: String,
    user_agent: String,
}

impl StaticHttpUserAgentSettings {
    pub fn new(accept_language: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            accept_language: accept_language.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn accept_language(&self) -> &str {
        &self.accept_language
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
