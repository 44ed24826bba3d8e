// Monitor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the lifecycle monitor scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Interval between lifecycle ticks.
    pub tick_interval: Duration,
    /// Fallback delay before re-checking the identity certificate's status
    /// when the responder reports no next-update time.
    pub ocsp_retry_interval: Duration,
    /// Capacity of the status-changed notification channel.
    pub notification_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            ocsp_retry_interval: Duration::from_secs(300),
            notification_capacity: 16,
        }
    }
}
