//! Certificate Transparency (CT) primitives and the shared compliance
//! delegate.
//!
//! One [`RequireCtDelegate`] instance is shared by the certificate
//! verifier and the transport security state, so CT compliance decisions
//! are evaluated by exactly one policy throughout a context.

use time::OffsetDateTime;

/// Signed Certificate Timestamp from a CT log.
#[derive(Debug, Clone)]
pub struct Sct {
    /// Log ID (32-byte SHA-256 hash of log's public key)
    pub log_id: [u8; 32],
    /// Timestamp when the SCT was issued
    pub timestamp: OffsetDateTime,
    /// SCT signature
    pub signature: Vec<u8>,
}

/// Result of SCT verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SctStatus {
    /// SCT is valid and from a known log
    Valid,
    /// SCT signature verification failed
    InvalidSignature,
    /// SCT is from an unknown log
    UnknownLog,
    /// SCT timestamp is in the future
    FutureTimestamp,
}

/// CT verification requirements for one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtRequirement {
    /// CT not required
    NotRequired,
    /// CT required but may be missing (warning)
    SoftFail,
    /// CT required (connection fails without valid SCTs)
    Required,
}

/// Per-host CT requirement policy, consulted by both the certificate
/// verifier and the transport security state.
pub trait RequireCtDelegate: Send + Sync {
    fn is_ct_required(&self, host: &str) -> CtRequirement;
}

/// Default policy: soft-fail everywhere.
#[derive(Debug, Default)]
pub struct DefaultRequireCtDelegate;

impl RequireCtDelegate for DefaultRequireCtDelegate {
    fn is_ct_required(&self, _host: &str) -> CtRequirement {
        CtRequirement::SoftFail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delegate_soft_fails() {
        let delegate = DefaultRequireCtDelegate;
        assert_eq!(delegate.is_ct_required("example.com"), CtRequirement::SoftFail);
    }
}
