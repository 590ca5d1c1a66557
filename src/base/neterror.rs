use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Network error codes for the request path.
///
/// Numeric values follow Chromium's `net_error_list.h` ranges: connection
/// errors in -1xx, request/URL errors in -3xx, cache errors in -4xx.
/// Construction of the context itself never produces a `NetError`; these
/// surface only when a request is dispatched through the built graph.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    #[error("Generic failure")]
    Failed,
    #[error("File not found")]
    FileNotFound,
    #[error("Not implemented")]
    NotImplemented,

    // Connection Errors
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Failed to resolve {domain}: {cause}")]
    NameNotResolvedFor {
        domain: String,
        cause: Arc<io::Error>,
    },
    #[error("Mandatory proxy configuration failed")]
    MandatoryProxyConfigurationFailed,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Malformed identity")]
    MalformedIdentity,
    #[error("Invalid auth credentials")]
    InvalidAuthCredentials,
    #[error("Unsupported auth scheme")]
    UnsupportedAuthScheme,
    #[error("Misconfigured auth environment")]
    MisconfiguredAuthEnvironment,

    // Cache Errors
    #[error("Cache miss")]
    CacheMiss,
    #[error("Cache read failure")]
    CacheReadFailure,
    #[error("Cache write failure")]
    CacheWriteFailure,
    #[error("Cache create failure")]
    CacheCreateFailure,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Failed => -2,
            NetError::FileNotFound => -6,
            NetError::NotImplemented => -11,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::MandatoryProxyConfigurationFailed => -131,
            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::UnknownUrlScheme => -302,
            NetError::InvalidResponse => -320,
            NetError::MalformedIdentity => -329,
            NetError::InvalidAuthCredentials => -338,
            NetError::UnsupportedAuthScheme => -339,
            NetError::MisconfiguredAuthEnvironment => -343,
            NetError::CacheMiss => -400,
            NetError::CacheReadFailure => -401,
            NetError::CacheWriteFailure => -402,
            NetError::CacheCreateFailure => -405,
            NetError::Unknown(code) => *code,
        }
    }

    /// DNS failure with the originating IO error attached.
    pub fn dns_failed(domain: impl Into<String>, cause: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            cause: Arc::new(cause),
        }
    }
}

// Errors compare by code so that context-carrying variants still match their
// bare counterparts in tests and retry logic.
impl PartialEq for NetError {
    fn eq(&self, other: &Self) -> bool {
        self.as_i32() == other.as_i32()
    }
}

impl Eq for NetError {}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -2 => NetError::Failed,
            -6 => NetError::FileNotFound,
            -11 => NetError::NotImplemented,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -131 => NetError::MandatoryProxyConfigurationFailed,
            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -302 => NetError::UnknownUrlScheme,
            -320 => NetError::InvalidResponse,
            -329 => NetError::MalformedIdentity,
            -338 => NetError::InvalidAuthCredentials,
            -339 => NetError::UnsupportedAuthScheme,
            -343 => NetError::MisconfiguredAuthEnvironment,
            -400 => NetError::CacheMiss,
            -401 => NetError::CacheReadFailure,
            -402 => NetError::CacheWriteFailure,
            -405 => NetError::CacheCreateFailure,
            _ => NetError::Unknown(code),
        }
    }
}
