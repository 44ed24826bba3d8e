// Status notifications - fire-and-forget enrollment status events

use crate::types::EnrollmentStatus;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// A single status-changed event, published once per processed enrollment
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChanged {
    pub status: EnrollmentStatus,
    pub at: DateTime<Utc>,
}

/// Publishes status-changed events to any number of observers (audit log,
/// operator UI).
///
/// Publishing never blocks and never fails; events sent while no observer
/// is subscribed are dropped.
pub struct StatusNotifier {
    tx: broadcast::Sender<StatusChanged>,
}

impl StatusNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attach a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChanged> {
        self.tx.subscribe()
    }

    /// Publish a status change. Fire-and-forget.
    pub fn publish(&self, status: EnrollmentStatus) {
        tracing::debug!(?status, "enrollment status changed");
        let _ = self.tx.send(StatusChanged {
            status,
            at: Utc::now(),
        });
    }
}
