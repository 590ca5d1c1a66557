//! Host remapping: rule parsing and the resolver wrapper that applies it.
//!
//! Rules use the `MAP <pattern> <replacement>[:<port>]` / `EXCLUDE <pattern>`
//! grammar, comma separated, e.g. `MAP *.test 127.0.0.1, EXCLUDE localhost`.
//! Malformed fragments are skipped; a fully malformed string leaves the
//! rule set empty and resolution unchanged.

use super::{Name, Resolve, Resolving};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum MappingRule {
    Map {
        pattern: String,
        replacement: String,
        port: Option<u16>,
    },
    Exclude {
        pattern: String,
    },
}

/// Ordered host mapping rules, first match wins.
#[derive(Debug, Clone, Default)]
pub struct HostMappingRules {
    rules: Vec<MappingRule>,
}

impl HostMappingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rules from a comma-separated string, appending to any existing
    /// rules. Fragments that do not parse are skipped with a warning.
    pub fn set_rules_from_string(&mut self, rules: &str) {
        for fragment in rules.split(',').map(str::trim) {
            if fragment.is_empty() {
                continue;
            }
            let mut parts = fragment.split_whitespace();
            let keyword = parts.next().unwrap_or("").to_ascii_lowercase();
            match keyword.as_str() {
                "map" => {
                    let (Some(pattern), Some(replacement)) = (parts.next(), parts.next()) else {
                        tracing::warn!(rule = %fragment, "ignoring malformed host mapping rule");
                        continue;
                    };
                    let (host, port) = match replacement.rsplit_once(':') {
                        Some((h, p)) => match p.parse::<u16>() {
                            Ok(port) => (h, Some(port)),
                            Err(_) => (replacement, None),
                        },
                        None => (replacement, None),
                    };
                    self.rules.push(MappingRule::Map {
                        pattern: pattern.to_ascii_lowercase(),
                        replacement: host.to_ascii_lowercase(),
                        port,
                    });
                }
                "exclude" => {
                    let Some(pattern) = parts.next() else {
                        tracing::warn!(rule = %fragment, "ignoring malformed host mapping rule");
                        continue;
                    };
                    self.rules.push(MappingRule::Exclude {
                        pattern: pattern.to_ascii_lowercase(),
                    });
                }
                _ => {
                    tracing::warn!(rule = %fragment, "ignoring malformed host mapping rule");
                }
            }
        }
    }

    /// Apply the rules to `host`, returning the replacement host and an
    /// optional replacement port. `None` means no rule matched.
    pub fn rewrite(&self, host: &str) -> Option<(String, Option<u16>)> {
        let host = host.to_ascii_lowercase();
        for rule in &self.rules {
            match rule {
                MappingRule::Exclude { pattern } => {
                    if match_host_pattern(pattern, &host) {
                        return None;
                    }
                }
                MappingRule::Map {
                    pattern,
                    replacement,
                    port,
                } => {
                    if match_host_pattern(pattern, &host) {
                        return Some((replacement.clone(), *port));
                    }
                }
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Glob-style host matching; `*` matches any run of characters.
fn match_host_pattern(pattern: &str, host: &str) -> bool {
    fn matches(p: &[u8], h: &[u8]) -> bool {
        match (p.first(), h.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                matches(&p[1..], h) || (!h.is_empty() && matches(p, &h[1..]))
            }
            (Some(pc), Some(hc)) if pc == hc => matches(&p[1..], &h[1..]),
            _ => false,
        }
    }
    matches(pattern.as_bytes(), host.as_bytes())
}

/// Resolver wrapper that rewrites host names before delegating.
///
/// Mirrors Chromium's `MappedHostResolver`: the wrapper owns the rules and
/// the inner resolver, and a rule with an explicit port overrides the port
/// on every resolved address.
pub struct MappedHostResolver {
    inner: Arc<dyn Resolve>,
    rules: HostMappingRules,
}

impl MappedHostResolver {
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        Self {
            inner,
            rules: HostMappingRules::new(),
        }
    }

    /// Append rules parsed from `rules`; malformed fragments are ignored.
    pub fn set_rules_from_string(&mut self, rules: &str) {
        self.rules.set_rules_from_string(rules);
    }

    pub fn rules(&self) -> &HostMappingRules {
        &self.rules
    }
}

impl Resolve for MappedHostResolver {
    fn resolve(&self, name: Name) -> Resolving {
        match self.rules.rewrite(name.as_str()) {
            Some((replacement, port)) => {
                tracing::debug!(from = %name, to = %replacement, "host remapped");
                let resolving = self.inner.resolve(Name::new(replacement));
                match port {
                    Some(port) => Box::pin(async move {
                        let addrs = resolving.await?;
                        let remapped: Vec<SocketAddr> = addrs
                            .map(|mut addr| {
                                addr.set_port(port);
                                addr
                            })
                            .collect();
                        Ok(Box::new(remapped.into_iter()) as super::Addrs)
                    }),
                    None => resolving,
                }
            }
            None => self.inner.resolve(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::NetError;
    use std::net::{IpAddr, Ipv4Addr};

    struct FixedResolver(IpAddr);

    impl Resolve for FixedResolver {
        fn resolve(&self, name: Name) -> Resolving {
            let addr = SocketAddr::new(self.0, 0);
            let host = name.as_str().to_string();
            Box::pin(async move {
                if host == "unreachable.test" {
                    return Err(NetError::NameNotResolved);
                }
                Ok(Box::new(std::iter::once(addr)) as super::super::Addrs)
            })
        }
    }

    #[test]
    fn test_parse_and_rewrite() {
        let mut rules = HostMappingRules::new();
        rules.set_rules_from_string("MAP *.example.com proxy.test, MAP other.com 10.0.0.1:8080");

        assert_eq!(
            rules.rewrite("www.example.com"),
            Some(("proxy.test".to_string(), None))
        );
        assert_eq!(
            rules.rewrite("other.com"),
            Some(("10.0.0.1".to_string(), Some(8080)))
        );
        assert_eq!(rules.rewrite("unrelated.org"), None);
    }

    #[test]
    fn test_exclude_takes_precedence() {
        let mut rules = HostMappingRules::new();
        rules.set_rules_from_string("EXCLUDE www.example.com, MAP *.example.com proxy.test");
        assert_eq!(rules.rewrite("www.example.com"), None);
        assert!(rules.rewrite("api.example.com").is_some());
    }

    #[test]
    fn test_malformed_fragments_skipped() {
        let mut rules = HostMappingRules::new();
        rules.set_rules_from_string("MAP, bogus rule here, EXCLUDE, MAP a.test b.test");
        assert_eq!(rules.rewrite("a.test"), Some(("b.test".to_string(), None)));
    }

    #[test]
    fn test_fully_malformed_string_leaves_rules_empty() {
        let mut rules = HostMappingRules::new();
        rules.set_rules_from_string("complete nonsense");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(match_host_pattern("*", "anything.com"));
        assert!(match_host_pattern("*.google.com", "www.google.com"));
        assert!(!match_host_pattern("*.google.com", "google.com"));
        assert!(match_host_pattern("exact.com", "exact.com"));
        assert!(!match_host_pattern("exact.com", "nexact.com"));
    }

    #[tokio::test]
    async fn test_mapped_resolver_rewrites_port() {
        let inner = Arc::new(FixedResolver(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        let mut resolver = MappedHostResolver::new(inner);
        resolver.set_rules_from_string("MAP remap.test localhost:4443");

        let addrs: Vec<_> = resolver
            .resolve(Name::new("remap.test"))
            .await
            .unwrap()
            .collect();
        assert_eq!(addrs[0].port(), 4443);
    }

    #[tokio::test]
    async fn test_unmatched_host_passes_through() {
        let inner = Arc::new(FixedResolver(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        let resolver = MappedHostResolver::new(inner);

        let addrs: Vec<_> = resolver
            .resolve(Name::new("plain.test"))
            .await
            .unwrap()
            .collect();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].port(), 0);
    }
}
