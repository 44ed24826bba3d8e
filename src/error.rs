// Error types for certsentry
//
// Validation rejections are normal return values, not exceptions: the
// transport layer receives a typed reason and is solely responsible for
// closing the connection. Nothing here is retried by the validators.

use crate::types::RevocationStatus;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reason a presented certificate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No certificate was presented at all.
    #[error("no certificate was presented")]
    Missing,

    /// The validity window has ended.
    #[error("certificate expired on {not_after}")]
    Expired { not_after: DateTime<Utc> },

    /// The validity window has not started yet.
    #[error("certificate not valid until {not_before}")]
    NotYetValid { not_before: DateTime<Utc> },

    /// The trust chain failed to build for a fatal reason.
    #[error("certificate chain validation failed: {status_text}")]
    ChainInvalid { status_text: String },

    /// The certificate's revocation status is not Good.
    #[error("certificate status is {status:?}, expected Good")]
    StatusNotGood { status: RevocationStatus },

    /// A required live status check could not be completed. Fail closed.
    #[error("live certificate status check failed: {details}")]
    StatusUnavailable { details: String },
}

impl ValidationError {
    /// Whether the rejection is about the validity window.
    pub fn is_expiry(&self) -> bool {
        matches!(self, Self::Expired { .. } | Self::NotYetValid { .. })
    }
}
