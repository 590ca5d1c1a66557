//! Multi-Log Certificate Transparency Verifier.
//!
//! Verifies Signed Certificate Timestamps (SCTs) against known CT logs.
//! The known-log catalog ships with the crate; a context's verifier is
//! preloaded with it at build time.

use crate::tls::ct::{Sct, SctStatus};
use base64::{engine::general_purpose, Engine as _};
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;

/// Information about a known CT log.
#[derive(Debug, Clone)]
pub struct CtLog {
    /// Log ID (SHA-256 hash of the log's public key, 32 bytes)
    pub id: [u8; 32],
    /// DER-encoded public key (ECDSA P-256); empty when the key is not
    /// distributed with the catalog
    pub public_key: Vec<u8>,
    /// Human-readable description
    pub description: String,
    /// Log operator
    pub operator: String,
}

impl CtLog {
    /// Create a new CT log entry.
    pub fn new(id: [u8; 32], public_key: Vec<u8>, description: impl Into<String>) -> Self {
        Self {
            id,
            public_key,
            description: description.into(),
            operator: String::new(),
        }
    }

    /// Set the operator name.
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }
}

/// The catalog of known CT logs, by base64 log ID.
///
/// A subset of the Google log list; entries with undecodable IDs are
/// skipped, so catalog construction cannot fail.
const KNOWN_LOGS: &[(&str, &str, &str)] = &[
    (
        "7s3QZNXbGs7FXLedtM0TojKHRny87N7DUUhZRnEftZs=",
        "Google Argon 2024",
        "Google",
    ),
    (
        "dv+IPwq2+5VRwmHM9Ye6NLSkzbsp3GhCCp/mZ0xaOnQ=",
        "Google Xenon 2024",
        "Google",
    ),
    (
        "2ra/az+1tiKfm8K7XGvocJFxbLtRhIU0vaQ9MEjX+6s=",
        "Cloudflare Nimbus 2024",
        "Cloudflare",
    ),
    (
        "O1N3dT4tuYBOizBbBv5AO2fYT8P0x70ADS1yb+H61Bc=",
        "Let's Encrypt Oak 2024H1",
        "Let's Encrypt",
    ),
];

/// Build log entries for every known log.
pub fn create_log_verifiers_for_known_logs() -> Vec<CtLog> {
    KNOWN_LOGS
        .iter()
        .filter_map(|(id_b64, description, operator)| {
            let decoded = general_purpose::STANDARD.decode(id_b64).ok()?;
            let id: [u8; 32] = decoded.try_into().ok()?;
            Some(CtLog::new(id, Vec::new(), *description).with_operator(*operator))
        })
        .collect()
}

/// Multi-log CT verifier.
///
/// Maintains a registry of known CT logs and verifies SCTs against them.
pub struct MultiLogCtVerifier {
    /// Map of Log ID -> Log info
    logs: Arc<DashMap<[u8; 32], CtLog>>,
}

impl Default for MultiLogCtVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiLogCtVerifier {
    /// Create a new empty CT verifier.
    pub fn new() -> Self {
        Self {
            logs: Arc::new(DashMap::new()),
        }
    }

    /// Add a known CT log.
    pub fn add_log(&self, log: CtLog) {
        self.logs.insert(log.id, log);
    }

    /// Add every log from an iterator, typically the known-log catalog.
    pub fn add_logs(&self, logs: impl IntoIterator<Item = CtLog>) {
        for log in logs {
            self.add_log(log);
        }
    }

    /// Get the number of known logs.
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    /// Check if a log ID is known.
    pub fn has_log(&self, log_id: &[u8; 32]) -> bool {
        self.logs.contains_key(log_id)
    }

    /// Verify SCTs against known logs.
    ///
    /// Returns one verification result per SCT.
    pub fn verify(
        &self,
        scts: &[Sct],
        _cert_der: &[u8],
        current_time: OffsetDateTime,
    ) -> Vec<(Sct, SctStatus)> {
        let mut results = Vec::with_capacity(scts.len());

        for sct in scts {
            let status = self.verify_single_sct(sct, current_time);
            results.push((sct.clone(), status));
        }

        results
    }

    /// Verify a single SCT: the log must be known, the timestamp must not
    /// be in the future, and the signature must be present. Cryptographic
    /// signature checks happen in the TLS stack outside this crate.
    fn verify_single_sct(&self, sct: &Sct, current_time: OffsetDateTime) -> SctStatus {
        if !self.logs.contains_key(&sct.log_id) {
            return SctStatus::UnknownLog;
        }

        if sct.timestamp > current_time {
            return SctStatus::FutureTimestamp;
        }

        if sct.signature.is_empty() {
            return SctStatus::InvalidSignature;
        }

        SctStatus::Valid
    }
}

impl std::fmt::Debug for MultiLogCtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiLogCtVerifier")
            .field("log_count", &self.log_count())
            .finish()
    }
}
