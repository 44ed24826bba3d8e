// Core types - certificates, configuration, enrollment outcomes, status results

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use x509_parser::prelude::*;

/// Process-wide certificate configuration.
///
/// Supplied fresh by the [`CertificateService`](crate::service::CertificateService)
/// on every lifecycle tick and validation call; never cached by this crate
/// beyond a single tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// Whether the enrollment/renewal state machine is active.
    pub scep_enabled: bool,
    /// Whether the monitor periodically checks the identity certificate's
    /// revocation status.
    pub ocsp_enabled: bool,
    /// Whether server certificates must match the requested host.
    pub validate_domain: bool,
    /// Delay before a pending enrollment is polled again.
    pub manual_polling_interval: Duration,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            scep_enabled: false,
            ocsp_enabled: true,
            // Fail closed: an unknown configuration still validates domains.
            validate_domain: true,
            manual_polling_interval: Duration::from_secs(60),
        }
    }
}

/// An X.509 certificate as seen by the trust core.
///
/// The core only inspects certificates, it never mutates them. Hosts that
/// already parse certificates elsewhere can fill the fields directly;
/// [`Certificate::from_der`] lifts raw wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Lowercase hex SHA-256 digest of the DER encoding.
    pub thumbprint: String,
    /// Subject distinguished name.
    pub subject: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// DNS and IP subject alternative name entries.
    pub subject_alt_names: Vec<String>,
    /// DER encoding of the certificate.
    pub raw: Vec<u8>,
}

impl Certificate {
    /// Parse a DER-encoded certificate into the core's representation.
    pub fn from_der(der: &[u8]) -> crate::Result<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| anyhow::anyhow!("failed to parse DER certificate: {e}"))?;

        let not_before = DateTime::<Utc>::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .context("certificate notBefore out of range")?;
        let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .context("certificate notAfter out of range")?;

        let mut subject_alt_names = Vec::new();
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => subject_alt_names.push((*dns).to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(addr) = ip_from_bytes(bytes) {
                            subject_alt_names.push(addr.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            thumbprint: hex::encode(Sha256::digest(der)),
            subject: cert.subject().to_string(),
            not_before,
            not_after,
            subject_alt_names,
            raw: der.to_vec(),
        })
    }

    /// Whether `at` falls inside the certificate's validity window.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

/// Revocation status of a certificate as reported by the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationStatus {
    Good,
    Revoked,
    Unknown,
}

/// Result of a revocation status check.
///
/// A `Good` entry is trustworthy only while `now < next_update`; absence of
/// `next_update` means "never cache, always re-check".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateStatusResult {
    pub status: RevocationStatus,
    pub verified_at: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    /// Set while the responder has been unreachable.
    pub offline_since: Option<DateTime<Utc>>,
}

impl CertificateStatusResult {
    /// Whether this result can be trusted at `now` without a live re-check.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.status == RevocationStatus::Good
            && self.next_update.map_or(false, |next| now < next)
    }
}

/// Status value carried by a status-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Enrolled,
    Pending,
    Denied,
    Error,
}

/// Outcome of a renew, exchange, or poll call against the certificate service.
#[derive(Debug, Clone)]
pub enum EnrollmentOutcome {
    /// The operation failed; it is retried at the next due time.
    Error,
    /// The CA refused the request; operator intervention is required.
    Denied,
    /// The CA has not decided yet; poll again later with the saved request.
    Pending {
        request_data: Vec<u8>,
        signing_certificate: Certificate,
    },
    /// A certificate was issued. The payload is `None` only if the service
    /// misreported success, which is logged as an error downstream.
    Enrolled { certificate: Option<Certificate> },
}

impl EnrollmentOutcome {
    /// Status value published for this outcome.
    pub fn status(&self) -> EnrollmentStatus {
        match self {
            Self::Error => EnrollmentStatus::Error,
            Self::Denied => EnrollmentStatus::Denied,
            Self::Pending { .. } => EnrollmentStatus::Pending,
            Self::Enrolled { .. } => EnrollmentStatus::Enrolled,
        }
    }
}

/// A single condition reported while building a trust chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainStatusFlag {
    UntrustedRoot,
    PartialChain,
    RevocationStatusUnknown,
    OfflineRevocation,
    NotTimeValid,
    NotSignatureValid,
    Other,
}

impl ChainStatusFlag {
    /// Whether this condition only reports an incomplete chain or an
    /// inconclusive revocation lookup rather than a hard failure.
    pub fn is_inconclusive(self) -> bool {
        matches!(
            self,
            Self::PartialChain | Self::RevocationStatusUnknown | Self::OfflineRevocation
        )
    }
}

/// One reported chain status with its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatusEntry {
    pub flag: ChainStatusFlag,
    pub message: String,
}

impl ChainStatusEntry {
    pub fn new(flag: ChainStatusFlag, message: impl Into<String>) -> Self {
        Self {
            flag,
            message: message.into(),
        }
    }
}

/// Result of building a certificate's trust chain. Ephemeral, computed per
/// validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCheckOutcome {
    pub valid: bool,
    pub statuses: Vec<ChainStatusEntry>,
}

impl ChainCheckOutcome {
    /// A chain that built cleanly.
    pub fn trusted() -> Self {
        Self {
            valid: true,
            statuses: Vec::new(),
        }
    }

    /// A chain that failed to build, with the reported conditions.
    pub fn failed(statuses: Vec<ChainStatusEntry>) -> Self {
        Self {
            valid: false,
            statuses,
        }
    }

    pub fn untrusted_root(&self) -> bool {
        self.statuses
            .iter()
            .any(|s| s.flag == ChainStatusFlag::UntrustedRoot)
    }

    pub fn partial_chain(&self) -> bool {
        self.statuses
            .iter()
            .any(|s| s.flag == ChainStatusFlag::PartialChain)
    }

    /// True when every reported condition is inconclusive (incomplete chain
    /// or unknown revocation status). Any other condition present, even
    /// alongside a partial chain, makes the failure fatal.
    pub fn only_inconclusive(&self) -> bool {
        self.statuses.iter().all(|s| s.flag.is_inconclusive())
    }

    /// Concatenated status messages for logging and rejection reasons.
    pub fn status_text(&self) -> String {
        self.statuses
            .iter()
            .map(|s| s.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
