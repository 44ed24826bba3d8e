// Peer Certificate Validator - authenticates certificates presented by connecting peers

use crate::error::ValidationError;
use crate::service::{CertificateService, ChainVerifier};
use crate::status::StatusCache;
use crate::types::{Certificate, RevocationStatus};
use chrono::Utc;
use std::sync::Arc;

/// Validates inbound peer certificates.
///
/// Applies a trust-on-first-use-but-recheck policy: a Good revocation
/// verdict is cached for exactly as long as the issuer says it stays fresh;
/// any non-Good or stale verdict forces a live re-check on every subsequent
/// attempt until the status is Good again.
pub struct PeerCertificateValidator<S, V> {
    service: Arc<S>,
    chain_verifier: Arc<V>,
    cache: Arc<StatusCache>,
}

impl<S, V> PeerCertificateValidator<S, V>
where
    S: CertificateService,
    V: ChainVerifier,
{
    pub fn new(service: Arc<S>, chain_verifier: Arc<V>, cache: Arc<StatusCache>) -> Self {
        Self {
            service,
            chain_verifier,
            cache,
        }
    }

    /// Decide whether an inbound peer certificate may be trusted right now.
    ///
    /// Blocks for a network round trip when the cached revocation status is
    /// missing, stale, or not Good.
    pub async fn validate(&self, certificate: Option<&Certificate>) -> Result<(), ValidationError> {
        let certificate = certificate.ok_or(ValidationError::Missing)?;
        let now = Utc::now();

        if now < certificate.not_before {
            return Err(ValidationError::NotYetValid {
                not_before: certificate.not_before,
            });
        }
        if now > certificate.not_after {
            return Err(ValidationError::Expired {
                not_after: certificate.not_after,
            });
        }

        // Build the trust chain with online revocation checking. The only
        // tolerated failure shape is an incomplete chain / inconclusive
        // revocation lookup; any other reported condition is fatal.
        let chain = self.chain_verifier.verify(certificate).await;
        if !chain.valid && !chain.only_inconclusive() {
            let status_text = chain.status_text();
            tracing::warn!(
                thumbprint = %certificate.thumbprint,
                "peer certificate chain rejected: {}",
                status_text
            );
            return Err(ValidationError::ChainInvalid { status_text });
        }

        let cached = self.cache.get(&certificate.thumbprint).await;
        let current = match cached {
            Some(entry) if entry.is_fresh(now) => entry,
            hint => {
                let fresh = self
                    .service
                    .peer_certificate_status(certificate, hint.as_ref())
                    .await
                    .map_err(|e| ValidationError::StatusUnavailable {
                        details: format!("{e:#}"),
                    })?;
                self.cache
                    .insert(certificate.thumbprint.clone(), fresh.clone())
                    .await;
                fresh
            }
        };

        if current.status != RevocationStatus::Good {
            tracing::warn!(
                thumbprint = %certificate.thumbprint,
                status = ?current.status,
                "peer certificate rejected: revocation status not Good"
            );
            return Err(ValidationError::StatusNotGood {
                status: current.status,
            });
        }

        Ok(())
    }
}
