// Server Certificate Validator - authenticates servers on outbound connections

use crate::service::CertificateService;
use crate::types::{Certificate, CertificateConfig, ChainCheckOutcome};
use crate::utils::net::resolve_host_addrs;
use chrono::Utc;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

/// Validates server certificates during outbound handshake completion.
///
/// Pure decision function with logging side effects: it never returns an
/// error to the caller. `false` means "abort the connection". Name
/// resolution failures count as "no match" and are never propagated.
pub struct ServerCertificateValidator<S> {
    service: Arc<S>,
}

impl<S: CertificateService> ServerCertificateValidator<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Decide whether an outbound server certificate may be trusted for
    /// `request_host`.
    pub async fn validate(
        &self,
        certificate: Option<&Certificate>,
        chain_errors: &ChainCheckOutcome,
        request_host: &str,
    ) -> bool {
        let Some(certificate) = certificate else {
            tracing::warn!(host = %request_host, "server rejected: no certificate presented");
            return false;
        };

        let now = Utc::now();
        if now > certificate.not_after {
            tracing::warn!(
                host = %request_host,
                not_after = %certificate.not_after,
                "server rejected: certificate expired"
            );
            return false;
        }
        if now < certificate.not_before {
            tracing::warn!(
                host = %request_host,
                not_before = %certificate.not_before,
                "server rejected: certificate not yet valid"
            );
            return false;
        }

        if chain_errors.untrusted_root() {
            tracing::warn!(
                host = %request_host,
                "server rejected: {}",
                chain_errors.status_text()
            );
            return false;
        }

        let config = match self.service.get_configuration().await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("failed to fetch certificate configuration, using defaults: {e:#}");
                CertificateConfig::default()
            }
        };

        if config.validate_domain && !matches_request_host(certificate, request_host).await {
            tracing::warn!(
                host = %request_host,
                thumbprint = %certificate.thumbprint,
                "server rejected: no subject alternative name matches the requested host"
            );
            return false;
        }

        true
    }
}

/// Check the certificate's subject alternative names against the requested
/// host, textually first and then by resolved address.
async fn matches_request_host(certificate: &Certificate, request_host: &str) -> bool {
    // Best effort; an empty set simply means address comparisons cannot match.
    let host_addrs: HashSet<IpAddr> = resolve_host_addrs(request_host).await.into_iter().collect();

    for san in &certificate.subject_alt_names {
        if san.eq_ignore_ascii_case(request_host) {
            return true;
        }

        if let Ok(addr) = san.parse::<IpAddr>() {
            if host_addrs.contains(&addr) {
                return true;
            }
            continue;
        }

        let san_addrs = resolve_host_addrs(san).await;
        if san_addrs
            .iter()
            .any(|addr| host_addrs.contains(addr) || addr.to_string().eq_ignore_ascii_case(request_host))
        {
            return true;
        }
    }

    false
}
