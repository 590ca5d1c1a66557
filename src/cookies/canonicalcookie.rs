use time::OffsetDateTime;

/// A fully canonicalized cookie as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub last_access_time: OffsetDateTime,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
    pub priority: CookiePriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CookiePriority {
    Low,
    Medium,
    High,
}

impl CanonicalCookie {
    pub fn new(
        name: String,
        value: String,
        domain: String,
        path: String,
        creation_time: OffsetDateTime,
        expiration_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name,
            value,
            domain,
            path,
            creation_time,
            expiration_time,
            last_access_time: creation_time,
            secure: false,
            http_only: false,
            host_only: true,
            same_site: SameSite::Unspecified,
            priority: CookiePriority::Medium,
        }
    }

    /// Session cookies (no expiration) never expire.
    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        if let Some(expiry) = self.expiration_time {
            expiry < current_time
        } else {
            false
        }
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn has_valid_prefix(&self, secure_origin: bool) -> bool {
        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return false;
        }

        if self.name.starts_with("__Host-")
            && (!self.secure || self.path != "/" || !self.host_only || !secure_origin)
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn cookie(name: &str) -> CanonicalCookie {
        CanonicalCookie::new(
            name.to_string(),
            "v".to_string(),
            "example.com".to_string(),
            "/".to_string(),
            OffsetDateTime::now_utc(),
            None,
        )
    }

    #[test]
    fn test_session_cookie_never_expires() {
        let c = cookie("session");
        assert!(!c.is_expired(OffsetDateTime::now_utc() + Duration::days(10000)));
    }

    #[test]
    fn test_expired_cookie() {
        let mut c = cookie("old");
        c.expiration_time = Some(OffsetDateTime::now_utc() - Duration::hours(1));
        assert!(c.is_expired(OffsetDateTime::now_utc()));
    }

    #[test]
    fn test_secure_prefix() {
        let mut c = cookie("__Secure-token");
        assert!(!c.has_valid_prefix(true));
        c.secure = true;
        assert!(c.has_valid_prefix(true));
        assert!(!c.has_valid_prefix(false));
    }

    #[test]
    fn test_host_prefix() {
        let mut c = cookie("__Host-token");
        c.secure = true;
        assert!(c.has_valid_prefix(true));
        c.path = "/sub".to_string();
        assert!(!c.has_valid_prefix(true));
    }
}
