//! HTTP authentication preferences and handler creation.
//!
//! The factory needs the shared host resolver because negotiate-style
//! handlers canonicalize the server name before producing a token; it is
//! therefore built after the resolver during context construction.

use crate::base::neterror::NetError;
use crate::dns::{Name, Resolve};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use url::Url;

/// Auth schemes enabled by default, in preference order.
const DEFAULT_SCHEMES: &[&str] = &["basic", "digest", "ntlm", "negotiate"];

/// Process-level authentication policy.
#[derive(Debug, Clone)]
pub struct HttpAuthPreferences {
    allowed_schemes: Vec<String>,
    server_allowlist: Vec<String>,
    delegate_allowlist: Vec<String>,
}

impl Default for HttpAuthPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAuthPreferences {
    pub fn new() -> Self {
        Self {
            allowed_schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
            server_allowlist: Vec::new(),
            delegate_allowlist: Vec::new(),
        }
    }

    /// Parse a comma-separated allowlist of servers that may receive
    /// ambient credentials. Entries may carry a `*.` prefix for subdomain
    /// matching; empty entries are dropped.
    pub fn set_server_allowlist(&mut self, allowlist: &str) {
        self.server_allowlist = parse_allowlist(allowlist);
    }

    /// Parse the allowlist of servers the negotiate handler may delegate
    /// credentials to.
    pub fn set_delegate_allowlist(&mut self, allowlist: &str) {
        self.delegate_allowlist = parse_allowlist(allowlist);
    }

    pub fn is_allowed_scheme(&self, scheme: &str) -> bool {
        self.allowed_schemes.iter().any(|s| s == scheme)
    }

    /// Whether ambient credentials may be sent to `host`.
    pub fn can_use_default_credentials(&self, host: &str) -> bool {
        matches_allowlist(&self.server_allowlist, host)
    }

    /// Whether the negotiate handler may delegate to `host`.
    pub fn can_delegate(&self, host: &str) -> bool {
        matches_allowlist(&self.delegate_allowlist, host)
    }
}

fn parse_allowlist(allowlist: &str) -> Vec<String> {
    allowlist
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn matches_allowlist(allowlist: &[String], host: &str) -> bool {
    let host = host.to_lowercase();
    allowlist.iter().any(|entry| {
        if entry == "*" {
            return true;
        }
        if let Some(suffix) = entry.strip_prefix("*.") {
            return host == suffix || host.ends_with(&format!(".{}", suffix));
        }
        host == *entry
    })
}

/// A handler for one auth scheme/challenge pair.
pub trait HttpAuthHandler: Send {
    fn scheme(&self) -> &'static str;

    /// Produce the `Authorization` header value for the given identity.
    fn generate_auth_token(&self, username: &str, password: &str) -> Result<String, NetError>;
}

/// RFC 7617 Basic authentication.
pub struct BasicAuthHandler {
    realm: String,
}

impl BasicAuthHandler {
    /// Parse a `Basic` challenge (the part after the scheme token).
    pub fn parse_challenge(challenge: &str) -> Self {
        Self {
            realm: parse_realm(challenge).unwrap_or_default(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }
}

impl HttpAuthHandler for BasicAuthHandler {
    fn scheme(&self) -> &'static str {
        "basic"
    }

    fn generate_auth_token(&self, username: &str, password: &str) -> Result<String, NetError> {
        if username.contains(':') {
            return Err(NetError::MalformedIdentity);
        }
        let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        Ok(format!("Basic {}", encoded))
    }
}

/// Kerberos/SPNEGO negotiation.
///
/// Canonicalizes the server name through the shared resolver; actual token
/// generation requires the platform GSSAPI/SSPI library, which sits outside
/// this crate, so it reports a misconfigured environment.
pub struct NegotiateAuthHandler {
    resolver: Arc<dyn Resolve>,
    server: String,
    can_delegate: bool,
}

impl NegotiateAuthHandler {
    pub fn new(resolver: Arc<dyn Resolve>, server: impl Into<String>, can_delegate: bool) -> Self {
        Self {
            resolver,
            server: server.into(),
            can_delegate,
        }
    }

    pub fn can_delegate(&self) -> bool {
        self.can_delegate
    }

    /// Resolve the server to confirm it is reachable under its canonical
    /// name before any ticket exchange.
    pub async fn canonicalize_server_name(&self) -> Result<String, NetError> {
        let _addrs = self.resolver.resolve(Name::new(self.server.clone())).await?;
        Ok(self.server.clone())
    }
}

impl HttpAuthHandler for NegotiateAuthHandler {
    fn scheme(&self) -> &'static str {
        "negotiate"
    }

    fn generate_auth_token(&self, _username: &str, _password: &str) -> Result<String, NetError> {
        tracing::debug!(server = %self.server, "no GSSAPI library wired into this context");
        Err(NetError::MisconfiguredAuthEnvironment)
    }
}

/// Creates auth handlers for challenges, honoring the preferences.
pub struct HttpAuthHandlerFactory {
    preferences: Arc<HttpAuthPreferences>,
    resolver: Arc<dyn Resolve>,
}

impl HttpAuthHandlerFactory {
    pub fn new(preferences: Arc<HttpAuthPreferences>, resolver: Arc<dyn Resolve>) -> Self {
        Self {
            preferences,
            resolver,
        }
    }

    pub fn preferences(&self) -> &HttpAuthPreferences {
        &self.preferences
    }

    /// Create a handler for `scheme` answering `challenge` from `origin`.
    ///
    /// Digest and NTLM challenges are recognized but their cryptographic
    /// backends live outside this crate, so they are reported unsupported
    /// alongside schemes the preferences exclude.
    pub fn create_auth_handler(
        &self,
        scheme: &str,
        challenge: &str,
        origin: &Url,
    ) -> Result<Box<dyn HttpAuthHandler>, NetError> {
        let scheme = scheme.to_lowercase();
        if !self.preferences.is_allowed_scheme(&scheme) {
            return Err(NetError::UnsupportedAuthScheme);
        }

        match scheme.as_str() {
            "basic" => Ok(Box::new(BasicAuthHandler::parse_challenge(challenge))),
            "negotiate" => {
                let host = origin.host_str().ok_or(NetError::InvalidUrl)?;
                let can_delegate = self.preferences.can_delegate(host);
                Ok(Box::new(NegotiateAuthHandler::new(
                    Arc::clone(&self.resolver),
                    host,
                    can_delegate,
                )))
            }
            _ => Err(NetError::UnsupportedAuthScheme),
        }
    }
}

impl std::fmt::Debug for HttpAuthHandlerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthHandlerFactory")
            .field("preferences", &self.preferences)
            .finish()
    }
}

/// Extract `realm="..."` from a challenge string.
fn parse_realm(challenge: &str) -> Option<String> {
    for part in challenge.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("realm=") {
            return Some(value.trim_matches('"').to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::GaiResolver;

    fn factory() -> HttpAuthHandlerFactory {
        HttpAuthHandlerFactory::new(
            Arc::new(HttpAuthPreferences::new()),
            Arc::new(GaiResolver::new()),
        )
    }

    #[test]
    fn test_basic_token() {
        let handler = BasicAuthHandler::parse_challenge(r#"realm="Protected""#);
        assert_eq!(handler.realm(), "Protected");
        assert_eq!(
            handler.generate_auth_token("user", "pass").unwrap(),
            "Basic dXNlcjpwYXNz"
        );
    }

    #[test]
    fn test_basic_rejects_colon_in_username() {
        let handler = BasicAuthHandler::parse_challenge("");
        assert_eq!(
            handler.generate_auth_token("user:name", "pass"),
            Err(NetError::MalformedIdentity)
        );
    }

    #[test]
    fn test_factory_creates_basic() {
        let origin = Url::parse("http://example.com/").unwrap();
        let handler = factory()
            .create_auth_handler("Basic", r#"realm="r""#, &origin)
            .unwrap();
        assert_eq!(handler.scheme(), "basic");
    }

    #[test]
    fn test_factory_rejects_unknown_scheme() {
        let origin = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            factory()
                .create_auth_handler("bearer", "", &origin)
                .err()
                .unwrap(),
            NetError::UnsupportedAuthScheme
        );
    }

    #[test]
    fn test_negotiate_respects_delegate_allowlist() {
        let mut prefs = HttpAuthPreferences::new();
        prefs.set_delegate_allowlist("*.corp.test");
        let factory = HttpAuthHandlerFactory::new(
            Arc::new(prefs),
            Arc::new(GaiResolver::new()),
        );

        let allowed = Url::parse("http://server.corp.test/").unwrap();
        let handler = factory
            .create_auth_handler("negotiate", "", &allowed)
            .unwrap();
        assert_eq!(handler.scheme(), "negotiate");

        // Token generation requires a platform library.
        assert_eq!(
            handler.generate_auth_token("", ""),
            Err(NetError::MisconfiguredAuthEnvironment)
        );
    }

    #[test]
    fn test_server_allowlist_matching() {
        let mut prefs = HttpAuthPreferences::new();
        prefs.set_server_allowlist("*.example.com, intranet");

        assert!(prefs.can_use_default_credentials("www.example.com"));
        assert!(prefs.can_use_default_credentials("example.com"));
        assert!(prefs.can_use_default_credentials("intranet"));
        assert!(!prefs.can_use_default_credentials("evil.com"));
    }

    #[test]
    fn test_empty_allowlist_denies_everything() {
        let prefs = HttpAuthPreferences::new();
        assert!(!prefs.can_use_default_credentials("example.com"));
        assert!(!prefs.can_delegate("example.com"));
    }
}
