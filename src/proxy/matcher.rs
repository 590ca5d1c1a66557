//! Proxy bypass matching.
//!
//! Provides domain and IP matching for proxy bypass rules.

use std::net::IpAddr;
use url::Url;

/// Bypass rule set for proxy resolution.
///
/// - Entries are comma-separated
/// - IP addresses and CIDR ranges supported
/// - Domain matching with optional leading dot
/// - Wildcard `*` matches all hosts
#[derive(Debug, Clone, Default)]
pub struct ProxyBypassRules {
    domains: Vec<String>,
    ips: Vec<IpMatch>,
    match_all: bool,
}

#[derive(Debug, Clone)]
enum IpMatch {
    Address(IpAddr),
    Cidr(IpAddr, u8),
}

impl ProxyBypassRules {
    /// Create from environment variables.
    ///
    /// Checks `NO_PROXY` then `no_proxy`.
    pub fn from_env() -> Self {
        let raw = std::env::var("NO_PROXY")
            .or_else(|_| std::env::var("no_proxy"))
            .unwrap_or_default();
        Self::parse(&raw)
    }

    /// Parse a comma-separated bypass list.
    ///
    /// Entries that parse as neither CIDR nor IP are treated as domains;
    /// nothing in the string can make parsing fail.
    pub fn parse(bypass: &str) -> Self {
        let mut rules = ProxyBypassRules::default();

        for part in bypass.split(',').map(str::trim) {
            if part.is_empty() {
                continue;
            }

            // Wildcard matches all
            if part == "*" {
                rules.match_all = true;
                continue;
            }

            // Try to parse as CIDR
            if let Some((ip_str, prefix_str)) = part.split_once('/') {
                if let Ok(ip) = ip_str.parse::<IpAddr>() {
                    if let Ok(prefix) = prefix_str.parse::<u8>() {
                        rules.ips.push(IpMatch::Cidr(ip, prefix));
                        continue;
                    }
                }
            }

            // Try to parse as IP
            if let Ok(ip) = part.parse::<IpAddr>() {
                rules.ips.push(IpMatch::Address(ip));
                continue;
            }

            // Otherwise treat as domain
            rules.domains.push(part.to_lowercase());
        }

        rules
    }

    /// Check if a host should bypass the proxy.
    pub fn matches(&self, host: &str) -> bool {
        if self.match_all {
            return true;
        }

        // Strip brackets from IPv6
        let host = host.trim_start_matches('[').trim_end_matches(']');

        // Try as IP first
        if let Ok(ip) = host.parse::<IpAddr>() {
            return self.ip_matches(ip);
        }

        // Check domain matching
        self.domain_matches(host)
    }

    /// Check if a URL's host should bypass the proxy.
    pub fn matches_url(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| self.matches(h))
    }

    pub fn is_empty(&self) -> bool {
        !self.match_all && self.domains.is_empty() && self.ips.is_empty()
    }

    fn ip_matches(&self, addr: IpAddr) -> bool {
        for ip_match in &self.ips {
            match ip_match {
                IpMatch::Address(ip) => {
                    if &addr == ip {
                        return true;
                    }
                }
                IpMatch::Cidr(network, prefix) => {
                    if cidr_contains(*network, *prefix, addr) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn domain_matches(&self, host: &str) -> bool {
        let host_lower = host.to_lowercase();

        for domain in &self.domains {
            // Strip leading dot for matching
            let domain_clean = domain.strip_prefix('.').unwrap_or(domain);

            // Exact match
            if host_lower == domain_clean {
                return true;
            }

            // Subdomain match: host must end with ".domain"
            // e.g., "www.example.com" matches ".example.com" or "example.com"
            // but "notexample.com" should NOT match "example.com"
            let with_dot = format!(".{}", domain_clean);
            if host_lower.ends_with(&with_dot) {
                return true;
            }
        }
        false
    }
}

/// Check if IP is within CIDR range.
fn cidr_contains(network: IpAddr, prefix: u8, addr: IpAddr) -> bool {
    match (network, addr) {
        (IpAddr::V4(net), IpAddr::V4(ip)) => {
            if prefix > 32 {
                return false;
            }
            let mask = if prefix == 0 {
                0u32
            } else {
                !0u32 << (32 - prefix)
            };
            (u32::from(net) & mask) == (u32::from(ip) & mask)
        }
        (IpAddr::V6(net), IpAddr::V6(ip)) => {
            if prefix > 128 {
                return false;
            }
            let net_bits = u128::from(net);
            let ip_bits = u128::from(ip);
            let mask = if prefix == 0 {
                0u128
            } else {
                !0u128 << (128 - prefix)
            };
            (net_bits & mask) == (ip_bits & mask)
        }
        _ => false,
    }
}
