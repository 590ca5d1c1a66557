//! Public Suffix List (PSL) validation for cookie domain security.
//!
//! Prevents supercookie attacks by rejecting domain cookies set on public
//! suffixes like `.com` or `.co.uk`. Uses Mozilla's Public Suffix List via
//! the `psl` crate.

use psl::{List, Psl};

/// Check if a domain is itself a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    if let Some(suffix) = List.suffix(domain_bytes) {
        suffix.as_bytes() == domain_bytes
    } else {
        // Unknown TLD - treat as potentially unsafe
        false
    }
}

/// Check if a cookie domain is valid for a given URL host: not a public
/// suffix, and matching the host or one of its parents.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
    let cookie_domain_lower = cookie_domain.to_lowercase();
    let url_host_lower = url_host.to_lowercase();

    if is_public_suffix(&cookie_domain_lower) {
        return false;
    }

    if url_host_lower == cookie_domain_lower {
        return true;
    }

    url_host_lower.ends_with(&format!(".{}", cookie_domain_lower))
}
