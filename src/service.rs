// External collaborator interfaces - CA-facing service and chain verification

use crate::types::{
    Certificate, CertificateConfig, CertificateStatusResult, ChainCheckOutcome, EnrollmentOutcome,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// CA-facing certificate service.
///
/// Owns the concrete enrollment and revocation wire protocols, certificate
/// persistence and installation. The lifecycle monitor and the validators
/// only ever talk to the CA through this interface. All network-bound
/// methods may block for a full round trip.
#[async_trait]
pub trait CertificateService: Send + Sync {
    /// Current process-wide configuration, fetched fresh on every call.
    async fn get_configuration(&self) -> Result<CertificateConfig>;

    /// Request renewal of the device identity certificate.
    async fn renew(&self) -> Result<EnrollmentOutcome>;

    /// Swap a certificate in as the active identity. `None` exchanges the
    /// currently active certificate for the next scheduled one.
    async fn exchange(&self, certificate: Option<Certificate>) -> Result<()>;

    /// Poll a pending enrollment using the saved request data.
    async fn poll(
        &self,
        request_data: &[u8],
        signing_certificate: &Certificate,
    ) -> Result<EnrollmentOutcome>;

    /// Install an issued certificate.
    async fn install_certificate(
        &self,
        certificate: Certificate,
        is_new_enrollment: bool,
    ) -> Result<()>;

    /// Revocation status of the device's own identity certificate.
    async fn own_certificate_status(
        &self,
        hint: Option<&CertificateStatusResult>,
    ) -> Result<CertificateStatusResult>;

    /// Revocation status of an arbitrary peer certificate. `hint` carries
    /// the last cached result for if-modified-since style lookups.
    async fn peer_certificate_status(
        &self,
        certificate: &Certificate,
        hint: Option<&CertificateStatusResult>,
    ) -> Result<CertificateStatusResult>;

    /// When the identity certificate is next due for renewal.
    async fn next_renewal_time(&self) -> DateTime<Utc>;

    /// When the identity certificate is next due for exchange.
    async fn next_exchange_time(&self) -> DateTime<Utc>;
}

/// Builds and checks the trust chain for a presented certificate, with
/// online revocation checking.
///
/// Chain-build failures are reported as statuses on the outcome, never as
/// errors; the caller decides which conditions are fatal.
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    async fn verify(&self, certificate: &Certificate) -> ChainCheckOutcome;
}
