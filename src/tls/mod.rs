//! Transport security, certificate verification, and CT policy.

pub mod certverifier;
pub mod ct;
pub mod ctverifier;
pub mod sslconfig;
pub mod transportsecurity;

pub use certverifier::{CertVerifier, CertVerifyResult, CtPolicyCompliance, CtPolicyEnforcer};
pub use ct::{CtRequirement, DefaultRequireCtDelegate, RequireCtDelegate, Sct, SctStatus};
pub use ctverifier::{create_log_verifiers_for_known_logs, CtLog, MultiLogCtVerifier};
pub use sslconfig::{SslConfig, SslConfigService, SslVersion};
pub use transportsecurity::{HstsEntry, TransportSecurityState};
