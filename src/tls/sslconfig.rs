//! SSL configuration defaults served to the network session.

/// TLS protocol versions the session may negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SslVersion {
    Tls12,
    Tls13,
}

/// SSL configuration for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslConfig {
    pub min_version: SslVersion,
    pub max_version: SslVersion,
    /// Accept connections despite certificate errors.
    pub ignore_certificate_errors: bool,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            min_version: SslVersion::Tls12,
            max_version: SslVersion::Tls13,
            ignore_certificate_errors: false,
        }
    }
}

/// Serves the context-wide SSL configuration.
#[derive(Debug, Default)]
pub struct SslConfigService {
    config: SslConfig,
}

impl SslConfigService {
    pub fn new(config: SslConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SslConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let service = SslConfigService::default();
        assert_eq!(service.config().min_version, SslVersion::Tls12);
        assert_eq!(service.config().max_version, SslVersion::Tls13);
        assert!(!service.config().ignore_certificate_errors);
    }
}
