// certsentry - Machine identity certificate lifecycle and trust validation
// Licensed under GPL-2.0

//! certsentry is the trust-lifecycle core of a network-connected device.
//! It keeps the device's machine identity certificate valid over its
//! lifetime (enrollment, renewal, exchange, periodic revocation checks
//! against a CA-facing service) and decides, synchronously for the
//! transport layer, whether certificates presented by remote parties may
//! be trusted right now.

pub mod error;
pub mod monitor;
pub mod service;
pub mod status;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::error::ValidationError;
pub use crate::monitor::{LifecycleMonitor, MonitorSettings, StatusChanged, StatusNotifier};
pub use crate::service::{CertificateService, ChainVerifier};
pub use crate::status::StatusCache;
pub use crate::types::{
    Certificate, CertificateConfig, CertificateStatusResult, ChainCheckOutcome, ChainStatusEntry,
    ChainStatusFlag, EnrollmentOutcome, EnrollmentStatus, RevocationStatus,
};
pub use crate::validation::{PeerCertificateValidator, ServerCertificateValidator};

/// Result type for certsentry operations
pub type Result<T> = anyhow::Result<T>;

/// Error type for certsentry operations
pub use anyhow::Error;
