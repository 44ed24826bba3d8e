// Status Cache - process-wide certificate status cache
//
// A concurrent map from certificate thumbprint to the last-known revocation
// status result, shared by every peer validation call in the process. One
// instance is created at startup and passed by Arc into each validator.
// Entries are replaced whole, never merged; last-writer-wins is acceptable
// because status lookups are idempotent reads against the certificate
// service.

use crate::types::CertificateStatusResult;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Thread-safe cache of revocation status results keyed by thumbprint.
pub struct StatusCache {
    entries: RwLock<HashMap<String, CertificateStatusResult>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Last-known status for a thumbprint, if any.
    ///
    /// The entry is returned even when stale or non-Good: callers use it as
    /// a hint for incremental lookups and decide freshness themselves via
    /// [`CertificateStatusResult::is_fresh`].
    pub async fn get(&self, thumbprint: &str) -> Option<CertificateStatusResult> {
        self.entries.read().await.get(thumbprint).cloned()
    }

    /// Replace the entry for a thumbprint with a fresh result.
    pub async fn insert(&self, thumbprint: String, result: CertificateStatusResult) {
        self.entries.write().await.insert(thumbprint, result);
    }

    /// Drop entries whose issuer-reported freshness window has passed (or
    /// that never had one). Returns the number of entries removed.
    pub async fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, result| result.next_update.map_or(false, |next| now < next));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}
