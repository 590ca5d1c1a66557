//! Switch names consumed while building a request context.

/// Disable the disk cache for HTTP requests.
pub const DISABLE_HTTP_CACHE: &str = "disable-http-cache";

/// Maximum disk cache size in bytes; 0 or unparsable means engine default.
pub const DISK_CACHE_SIZE: &str = "disk-cache-size";

/// Never use a proxy, even when other proxy switches are present.
pub const NO_PROXY_SERVER: &str = "no-proxy-server";

/// Fixed proxy server list, e.g. `http=proxy:8080;https=proxy:8443`.
pub const PROXY_SERVER: &str = "proxy-server";

/// Hosts that bypass the fixed proxy, comma separated.
pub const PROXY_BYPASS_LIST: &str = "proxy-bypass-list";

/// URL of a PAC script; resolution through it is mandatory.
pub const PROXY_PAC_URL: &str = "proxy-pac-url";

/// Host resolver remap rules, e.g. `MAP *.test 127.0.0.1`.
pub const HOST_RESOLVER_RULES: &str = "host-resolver-rules";

/// Transport-level host mapping rules applied inside the network session.
pub const HOST_RULES: &str = "host-rules";

/// Servers allowed to receive ambient authentication.
pub const AUTH_SERVER_ALLOWLIST: &str = "auth-server-allowlist";

/// Servers the negotiate handler may delegate credentials to.
pub const AUTH_NEGOTIATE_DELEGATE_ALLOWLIST: &str = "auth-negotiate-delegate-allowlist";

/// Disable HTTP/2 in the network session.
pub const DISABLE_HTTP2: &str = "disable-http2";

/// Accept TLS connections despite certificate errors.
pub const IGNORE_CERTIFICATE_ERRORS: &str = "ignore-certificate-errors";
