//! Proxy configuration values: server entries, rule lists, PAC settings.
//!
//! Rule strings follow the `--proxy-server` grammar: either one proxy list
//! applied to every scheme (`proxy1:8080;proxy2`) or per-scheme mappings
//! (`http=proxy:8080;https=secure:8443`). Malformed entries are skipped;
//! a fully malformed string leaves the empty configuration in place.

use super::matcher::ProxyBypassRules;
use std::collections::HashMap;
use url::Url;
use zeroize::Zeroizing;

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
    /// HTTP proxy (CONNECT for HTTPS)
    Http,
    /// HTTPS proxy (TLS to proxy)
    Https,
    /// SOCKS5 proxy
    Socks5,
}

impl ProxyType {
    fn default_port(self) -> u16 {
        match self {
            ProxyType::Http => 80,
            ProxyType::Https => 443,
            ProxyType::Socks5 => 1080,
        }
    }
}

/// A single proxy server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyServer {
    pub proxy_type: ProxyType,
    pub host: String,
    pub port: u16,
}

impl ProxyServer {
    /// Parse `[scheme://]host[:port]`. Returns `None` for empty or
    /// unparsable entries.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        let (proxy_type, rest) = match entry.split_once("://") {
            Some(("http", rest)) => (ProxyType::Http, rest),
            Some(("https", rest)) => (ProxyType::Https, rest),
            Some(("socks5" | "socks5h" | "socks4" | "socks4a" | "socks", rest)) => {
                (ProxyType::Socks5, rest)
            }
            Some(_) => return None,
            None => (ProxyType::Http, entry),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => match port_str.parse::<u16>() {
                Ok(port) => (host, port),
                Err(_) => return None,
            },
            None => (rest, proxy_type.default_port()),
        };

        if host.is_empty() {
            return None;
        }

        Some(Self {
            proxy_type,
            host: host.to_lowercase(),
            port,
        })
    }
}

/// Proxy rules: either one list for all schemes, or per-scheme lists.
#[derive(Debug, Clone, Default)]
pub struct ProxyRules {
    proxies_for_all: Vec<ProxyServer>,
    proxies_by_scheme: HashMap<String, Vec<ProxyServer>>,
}

impl ProxyRules {
    /// Parse a `--proxy-server` style rule string.
    ///
    /// Never fails: unparsable entries are dropped with a warning, and a
    /// string with nothing usable produces the empty rule set.
    pub fn parse(rules: &str) -> Self {
        let mut parsed = ProxyRules::default();

        for group in rules.split(';').map(str::trim) {
            if group.is_empty() {
                continue;
            }
            match group.split_once('=') {
                Some((scheme, servers)) => {
                    let scheme = scheme.trim().to_lowercase();
                    let list: Vec<ProxyServer> =
                        servers.split(',').filter_map(ProxyServer::parse).collect();
                    if scheme.is_empty() || list.is_empty() {
                        tracing::warn!(rule = %group, "ignoring malformed proxy rule");
                        continue;
                    }
                    parsed.proxies_by_scheme.entry(scheme).or_default().extend(list);
                }
                None => {
                    let list: Vec<ProxyServer> =
                        group.split(',').filter_map(ProxyServer::parse).collect();
                    if list.is_empty() {
                        tracing::warn!(rule = %group, "ignoring malformed proxy rule");
                        continue;
                    }
                    parsed.proxies_for_all.extend(list);
                }
            }
        }

        parsed
    }

    /// Pick the first proxy applicable to `url`, if any.
    pub fn proxy_for_url(&self, url: &Url) -> Option<&ProxyServer> {
        if let Some(list) = self.proxies_by_scheme.get(url.scheme()) {
            return list.first();
        }
        self.proxies_for_all.first()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies_for_all.is_empty() && self.proxies_by_scheme.is_empty()
    }
}

/// Complete proxy configuration for one context.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub rules: ProxyRules,
    pub bypass: ProxyBypassRules,
    pac_url: Option<Url>,
    pac_mandatory: bool,
    username: Option<String>,
    password: Option<Zeroizing<String>>,
}

impl ProxyConfig {
    /// Fixed configuration from rule and bypass strings, both parsed with
    /// silent fallback.
    pub fn from_rules(rules: &str, bypass: &str) -> Self {
        Self {
            rules: ProxyRules::parse(rules),
            bypass: ProxyBypassRules::parse(bypass),
            ..Self::default()
        }
    }

    /// Configuration driven by a PAC script at `pac_url`.
    pub fn from_pac_url(pac_url: Url) -> Self {
        Self {
            pac_url: Some(pac_url),
            ..Self::default()
        }
    }

    /// Mark PAC resolution mandatory: failures must not fall back to
    /// direct connections.
    pub fn set_pac_mandatory(&mut self, mandatory: bool) {
        self.pac_mandatory = mandatory;
    }

    pub fn pac_url(&self) -> Option<&Url> {
        self.pac_url.as_ref()
    }

    pub fn pac_mandatory(&self) -> bool {
        self.pac_mandatory
    }

    /// Attach authentication credentials.
    pub fn with_auth(mut self, user: &str, pass: &str) -> Self {
        self.username = Some(user.to_string());
        self.password = Some(Zeroizing::new(pass.to_string()));
        self
    }

    /// `Proxy-Authorization` header value, when credentials are present.
    pub fn auth_header(&self) -> Option<String> {
        if let (Some(u), Some(p)) = (&self.username, &self.password) {
            use base64::{engine::general_purpose, Engine as _};
            let creds = format!("{}:{}", u, p.as_str());
            let encoded = general_purpose::STANDARD.encode(creds);
            Some(format!("Basic {}", encoded))
        } else {
            None
        }
    }

    /// True when no rules, PAC URL, or bypass entries are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.pac_url.is_none() && self.bypass.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_forms() {
        let s = ProxyServer::parse("proxy.test").unwrap();
        assert_eq!(s.proxy_type, ProxyType::Http);
        assert_eq!(s.port, 80);

        let s = ProxyServer::parse("proxy.test:3128").unwrap();
        assert_eq!(s.port, 3128);

        let s = ProxyServer::parse("socks5://proxy.test").unwrap();
        assert_eq!(s.proxy_type, ProxyType::Socks5);
        assert_eq!(s.port, 1080);

        assert!(ProxyServer::parse("").is_none());
        assert!(ProxyServer::parse("gopher://x").is_none());
        assert!(ProxyServer::parse("host:notaport").is_none());
    }

    #[test]
    fn test_rules_single_list() {
        let rules = ProxyRules::parse("proxy1:8080,proxy2:8081");
        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(rules.proxy_for_url(&url).unwrap().host, "proxy1");
    }

    #[test]
    fn test_rules_per_scheme() {
        let rules = ProxyRules::parse("http=insecure:8080;https=secure:8443");
        let http = Url::parse("http://example.com/").unwrap();
        let https = Url::parse("https://example.com/").unwrap();
        let ftp = Url::parse("ftp://example.com/").unwrap();

        assert_eq!(rules.proxy_for_url(&http).unwrap().host, "insecure");
        assert_eq!(rules.proxy_for_url(&https).unwrap().host, "secure");
        assert!(rules.proxy_for_url(&ftp).is_none());
    }

    #[test]
    fn test_malformed_rules_leave_empty_config() {
        let rules = ProxyRules::parse(";;;=;garbage://");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_auth_header() {
        let config = ProxyConfig::from_rules("proxy:8080", "").with_auth("user", "pass");
        assert_eq!(config.auth_header().unwrap(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_pac_mandatory_flag() {
        let mut config = ProxyConfig::from_pac_url(Url::parse("http://pac.test/proxy.pac").unwrap());
        assert!(!config.pac_mandatory());
        config.set_pac_mandatory(true);
        assert!(config.pac_mandatory());
        assert!(config.pac_url().is_some());
    }
}
