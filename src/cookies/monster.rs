use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::changedispatcher::{CookieChangeCause, CookieChangeDispatcher};
use crate::cookies::psl;
use crate::cookies::store::SqlitePersistentCookieStore;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies across all domains.
const MAX_COOKIES_TOTAL: usize = 3000;

/// Schemes allowed to receive and send cookies unless configured otherwise.
const DEFAULT_COOKIEABLE_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

/// The main entry point for cookie management.
///
/// The jar lives on the build context; every mutation is reported through
/// the attached [`CookieChangeDispatcher`] on the mutating thread, and an
/// optional persistent store is written through on each change.
pub struct CookieMonster {
    // Store: Map<Domain, List<Cookie>>
    store: Arc<DashMap<String, Vec<CanonicalCookie>>>,
    cookieable_schemes: RwLock<Vec<String>>,
    dispatcher: CookieChangeDispatcher,
    persistent: Option<Arc<SqlitePersistentCookieStore>>,
}

impl Default for CookieMonster {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieMonster {
    /// In-memory jar with the default cookieable scheme set.
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            cookieable_schemes: RwLock::new(
                DEFAULT_COOKIEABLE_SCHEMES.iter().map(|s| s.to_string()).collect(),
            ),
            dispatcher: CookieChangeDispatcher::new(),
            persistent: None,
        }
    }

    /// Jar backed by a persistent store; previously persisted cookies are
    /// loaded without firing change notifications.
    pub fn with_persistent_store(persistent: Arc<SqlitePersistentCookieStore>) -> Self {
        let monster = Self {
            persistent: Some(Arc::clone(&persistent)),
            ..Self::new()
        };

        match persistent.load() {
            Ok(cookies) => {
                for cookie in cookies {
                    monster
                        .store
                        .entry(cookie.domain.clone())
                        .or_default()
                        .push(cookie);
                }
            }
            Err(e) => {
                tracing::warn!(path = %persistent.path().display(), error = %e,
                    "failed to load persisted cookies");
            }
        }

        monster
    }

    /// Replace the set of schemes that may carry cookies.
    pub fn set_cookieable_schemes(&self, schemes: Vec<String>) {
        *self.cookieable_schemes.write().expect("scheme set poisoned") = schemes;
    }

    pub fn is_cookieable_scheme(&self, scheme: &str) -> bool {
        self.cookieable_schemes
            .read()
            .expect("scheme set poisoned")
            .iter()
            .any(|s| s == scheme)
    }

    pub fn cookieable_schemes(&self) -> Vec<String> {
        self.cookieable_schemes
            .read()
            .expect("scheme set poisoned")
            .clone()
    }

    pub fn change_dispatcher(&self) -> &CookieChangeDispatcher {
        &self.dispatcher
    }

    /// Set a cookie for `url`, enforcing the cookieable scheme set and the
    /// public-suffix guard. Returns false when the cookie was rejected.
    pub fn set_cookie_for_url(&self, url: &Url, cookie: CanonicalCookie) -> bool {
        if !self.is_cookieable_scheme(url.scheme()) {
            tracing::debug!(scheme = %url.scheme(), "cookie rejected: scheme not cookieable");
            return false;
        }

        let host = url.host_str().unwrap_or("");
        if !cookie.host_only && !psl::is_valid_cookie_domain(&cookie.domain, host) {
            tracing::debug!(domain = %cookie.domain, host = %host,
                "cookie rejected: invalid domain");
            return false;
        }

        if !cookie.has_valid_prefix(url.scheme() == "https" || url.scheme() == "wss") {
            tracing::debug!(name = %cookie.name, "cookie rejected: invalid prefix");
            return false;
        }

        self.set_canonical_cookie(cookie);
        true
    }

    /// Insert a canonical cookie directly, replacing any cookie with the
    /// same name and path on the same domain.
    pub fn set_canonical_cookie(&self, cookie: CanonicalCookie) {
        let now = OffsetDateTime::now_utc();
        let mut evicted = Vec::new();

        {
            let mut entry = self.store.entry(cookie.domain.clone()).or_default();

            // Replace existing if name/path match
            if let Some(idx) = entry
                .iter()
                .position(|c| c.name == cookie.name && c.path == cookie.path)
            {
                let old = entry.remove(idx);
                let cause = if old.is_expired(now) {
                    CookieChangeCause::Expired
                } else {
                    CookieChangeCause::Overwrite
                };
                evicted.push((old, cause));
            }

            // Enforce per-domain limit, oldest first
            while entry.len() >= MAX_COOKIES_PER_DOMAIN {
                let Some(oldest_idx) = entry
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, c)| c.creation_time)
                    .map(|(i, _)| i)
                else {
                    break;
                };
                evicted.push((entry.remove(oldest_idx), CookieChangeCause::Evicted));
            }

            entry.push(cookie.clone());
        } // release the shard before notifying

        for (old, cause) in evicted {
            self.on_cookie_removed(&old, cause);
        }

        if let Some(persistent) = &self.persistent {
            if let Err(e) = persistent.add(&cookie) {
                tracing::warn!(error = %e, "cookie write-through failed");
            }
        }
        self.dispatcher.notify(&cookie, CookieChangeCause::Inserted);

        self.enforce_global_limit();
    }

    /// Delete one cookie by domain, name, and path.
    pub fn delete_cookie(&self, domain: &str, name: &str, path: &str) -> bool {
        let removed = {
            let mut entry = match self.store.get_mut(domain) {
                Some(entry) => entry,
                None => return false,
            };
            match entry.iter().position(|c| c.name == name && c.path == path) {
                Some(idx) => Some(entry.remove(idx)),
                None => None,
            }
        };

        match removed {
            Some(cookie) => {
                self.on_cookie_removed(&cookie, CookieChangeCause::Explicit);
                true
            }
            None => false,
        }
    }

    fn on_cookie_removed(&self, cookie: &CanonicalCookie, cause: CookieChangeCause) {
        if let Some(persistent) = &self.persistent {
            if let Err(e) = persistent.delete(cookie) {
                tracing::warn!(error = %e, "cookie delete-through failed");
            }
        }
        self.dispatcher.notify(cookie, cause);
    }

    /// Enforce the global cookie limit by evicting oldest cookies.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            // Find and remove the oldest cookie across all domains
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;

            for entry in self.store.iter() {
                let domain = entry.key().clone();
                for (idx, cookie) in entry.value().iter().enumerate() {
                    let dominated = oldest
                        .as_ref()
                        .is_some_and(|(_, _, oldest_time)| cookie.creation_time < *oldest_time);
                    if oldest.is_none() || dominated {
                        oldest = Some((domain.clone(), idx, cookie.creation_time));
                    }
                }
            }

            let Some((domain, idx, _)) = oldest else { break };
            let removed = self.store.get_mut(&domain).and_then(|mut entry| {
                if idx < entry.len() {
                    Some(entry.remove(idx))
                } else {
                    None
                }
            });
            match removed {
                Some(cookie) => self.on_cookie_removed(&cookie, CookieChangeCause::Evicted),
                None => break,
            }
        }
    }

    /// Get cookies matching the URL with proper domain suffix matching.
    ///
    /// Returns nothing for schemes outside the cookieable set.
    pub fn get_cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        if !self.is_cookieable_scheme(url.scheme()) {
            return Vec::new();
        }

        let mut result = Vec::new();
        let host = url.host_str().unwrap_or("");
        let now = OffsetDateTime::now_utc();
        let secure_transport = url.scheme() == "https" || url.scheme() == "wss";

        // Collect matching domains (host itself and parent domains)
        for domain in Self::matching_domains(host) {
            if let Some(entry) = self.store.get(&domain) {
                for cookie in entry.iter() {
                    if !Self::domain_matches(&cookie.domain, host, cookie.host_only) {
                        continue;
                    }
                    if !Self::path_matches(&cookie.path, url.path()) {
                        continue;
                    }
                    if cookie.secure && !secure_transport {
                        continue;
                    }
                    if cookie.is_expired(now) {
                        continue;
                    }
                    result.push(cookie.clone());
                }
            }
        }

        // Sort by path length (longest first) then creation time
        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// Purge expired cookies, notifying with the `Expired` cause.
    pub fn purge_expired(&self) {
        let now = OffsetDateTime::now_utc();
        let mut purged = Vec::new();

        for mut entry in self.store.iter_mut() {
            let mut idx = 0;
            while idx < entry.len() {
                if entry[idx].is_expired(now) {
                    purged.push(entry.remove(idx));
                } else {
                    idx += 1;
                }
            }
        }

        for cookie in purged {
            self.on_cookie_removed(&cookie, CookieChangeCause::Expired);
        }
    }

    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|entry| entry.value().len()).sum()
    }

    fn matching_domains(host: &str) -> Vec<String> {
        let host = host.to_lowercase();
        let mut domains = vec![host.clone()];
        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len() {
            domains.push(parts[i..].join("."));
        }
        domains
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            // Host-only cookie: exact match required
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        // Domain cookie: suffix match
        let cookie_domain = cookie_domain.trim_start_matches('.');

        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        // Check if request_host ends with .cookie_domain
        if request_host.len() > cookie_domain.len() {
            let suffix = &request_host[request_host.len() - cookie_domain.len()..];
            if suffix.eq_ignore_ascii_case(cookie_domain) {
                let char_before = request_host
                    .chars()
                    .nth(request_host.len() - cookie_domain.len() - 1);
                return char_before == Some('.');
            }
        }

        false
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            // Cookie path is a prefix; the next character must start a new
            // segment, or the cookie path itself ends with a slash.
            return cookie_path.ends_with('/')
                || request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
        }

        false
    }
}

impl std::fmt::Debug for CookieMonster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieMonster")
            .field("cookies", &self.total_cookie_count())
            .field("persistent", &self.persistent.is_some())
            .finish()
    }
}
