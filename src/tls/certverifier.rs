//! Certificate verification and CT policy enforcement.
//!
//! The verifier consults the same [`RequireCtDelegate`] instance that the
//! transport security state holds; chain validation itself happens in the
//! TLS stack outside this crate, so verification here covers the policy
//! decisions the context is responsible for.

use crate::base::neterror::NetError;
use crate::tls::ct::{CtRequirement, RequireCtDelegate, Sct, SctStatus};
use crate::tls::ctverifier::MultiLogCtVerifier;
use std::sync::Arc;
use time::OffsetDateTime;

/// Outcome of verifying one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertVerifyResult {
    /// CT requirement the delegate imposed on this host.
    pub ct_requirement: CtRequirement,
    /// Statuses of the presented SCTs, one per SCT.
    pub sct_statuses: Vec<SctStatus>,
    /// Whether CT policy was satisfied for this host.
    pub ct_policy_compliant: bool,
}

/// Certificate verifier bound to the shared CT delegate.
pub struct CertVerifier {
    ct_delegate: Arc<dyn RequireCtDelegate>,
}

impl CertVerifier {
    pub fn new(ct_delegate: Arc<dyn RequireCtDelegate>) -> Self {
        Self { ct_delegate }
    }

    /// Verify policy for `host` given its certificate and SCTs.
    ///
    /// A host whose delegate requires CT fails with [`NetError::Failed`]
    /// when no presented SCT validates; soft-fail hosts log and proceed.
    pub fn verify(
        &self,
        host: &str,
        cert_der: &[u8],
        scts: &[Sct],
        ct_verifier: &MultiLogCtVerifier,
    ) -> Result<CertVerifyResult, NetError> {
        if cert_der.is_empty() {
            return Err(NetError::Failed);
        }

        let requirement = self.ct_delegate.is_ct_required(host);
        let statuses: Vec<SctStatus> = ct_verifier
            .verify(scts, cert_der, OffsetDateTime::now_utc())
            .into_iter()
            .map(|(_, status)| status)
            .collect();
        let valid_scts = statuses.iter().filter(|s| **s == SctStatus::Valid).count();

        let compliant = match requirement {
            CtRequirement::NotRequired => true,
            CtRequirement::SoftFail => {
                if valid_scts == 0 {
                    tracing::debug!(host = %host, "no valid SCTs; proceeding (soft fail)");
                }
                true
            }
            CtRequirement::Required => valid_scts > 0,
        };

        if !compliant {
            tracing::debug!(host = %host, "CT required but no valid SCTs");
            return Err(NetError::Failed);
        }

        Ok(CertVerifyResult {
            ct_requirement: requirement,
            sct_statuses: statuses,
            ct_policy_compliant: compliant,
        })
    }
}

impl std::fmt::Debug for CertVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertVerifier").finish()
    }
}

/// CT policy compliance levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtPolicyCompliance {
    CompliesViaScts,
    NotEnoughScts,
    PolicyNotRequired,
}

/// Enforces the CT policy over verified SCT counts.
///
/// The diversity requirement (SCTs from logs of distinct operators) is
/// approximated by a minimum count of valid SCTs.
#[derive(Debug)]
pub struct CtPolicyEnforcer {
    min_scts: usize,
}

impl Default for CtPolicyEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

impl CtPolicyEnforcer {
    pub fn new() -> Self {
        Self { min_scts: 2 }
    }

    pub fn check_compliance(
        &self,
        requirement: CtRequirement,
        valid_sct_count: usize,
    ) -> CtPolicyCompliance {
        match requirement {
            CtRequirement::NotRequired => CtPolicyCompliance::PolicyNotRequired,
            CtRequirement::SoftFail | CtRequirement::Required => {
                if valid_sct_count >= self.min_scts {
                    CtPolicyCompliance::CompliesViaScts
                } else {
                    CtPolicyCompliance::NotEnoughScts
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::ct::DefaultRequireCtDelegate;
    use crate::tls::ctverifier::create_log_verifiers_for_known_logs;
    use time::Duration;

    struct RequireEverywhere;

    impl RequireCtDelegate for RequireEverywhere {
        fn is_ct_required(&self, _host: &str) -> CtRequirement {
            CtRequirement::Required
        }
    }

    fn known_sct() -> Sct {
        Sct {
            log_id: create_log_verifiers_for_known_logs()[0].id,
            timestamp: OffsetDateTime::now_utc() - Duration::days(1),
            signature: vec![1],
        }
    }

    fn preloaded_verifier() -> MultiLogCtVerifier {
        let v = MultiLogCtVerifier::new();
        v.add_logs(create_log_verifiers_for_known_logs());
        v
    }

    #[test]
    fn test_empty_cert_rejected() {
        let verifier = CertVerifier::new(Arc::new(DefaultRequireCtDelegate));
        let result = verifier.verify("example.com", &[], &[], &preloaded_verifier());
        assert_eq!(result, Err(NetError::Failed));
    }

    #[test]
    fn test_soft_fail_without_scts() {
        let verifier = CertVerifier::new(Arc::new(DefaultRequireCtDelegate));
        let result = verifier
            .verify("example.com", &[1, 2, 3], &[], &preloaded_verifier())
            .unwrap();
        assert!(result.ct_policy_compliant);
        assert_eq!(result.ct_requirement, CtRequirement::SoftFail);
    }

    #[test]
    fn test_required_without_scts_fails() {
        let verifier = CertVerifier::new(Arc::new(RequireEverywhere));
        let result = verifier.verify("example.com", &[1, 2, 3], &[], &preloaded_verifier());
        assert_eq!(result, Err(NetError::Failed));
    }

    #[test]
    fn test_required_with_valid_sct_passes() {
        let verifier = CertVerifier::new(Arc::new(RequireEverywhere));
        let result = verifier
            .verify(
                "example.com",
                &[1, 2, 3],
                &[known_sct()],
                &preloaded_verifier(),
            )
            .unwrap();
        assert_eq!(result.sct_statuses, vec![SctStatus::Valid]);
    }

    #[test]
    fn test_policy_enforcer_thresholds() {
        let enforcer = CtPolicyEnforcer::new();
        assert_eq!(
            enforcer.check_compliance(CtRequirement::NotRequired, 0),
            CtPolicyCompliance::PolicyNotRequired
        );
        assert_eq!(
            enforcer.check_compliance(CtRequirement::Required, 1),
            CtPolicyCompliance::NotEnoughScts
        );
        assert_eq!(
            enforcer.check_compliance(CtRequirement::Required, 2),
            CtPolicyCompliance::CompliesViaScts
        );
    }
}
