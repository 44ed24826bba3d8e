// Certificate Lifecycle Monitoring
//
// This module keeps the device's identity certificate valid over its
// lifetime:
// - Periodically re-checks the certificate's own revocation status (OCSP)
// - Requests renewal when the certificate service reports renewal is due
// - Exchanges the active certificate for the next scheduled one when due
// - Polls pending enrollments with a single cancellable delayed poll
// - Publishes fire-and-forget status-changed notifications to observers

pub mod config;
pub mod lifecycle;
pub mod notify;

// Re-export commonly used types
pub use config::MonitorSettings;
pub use lifecycle::{LifecycleMonitor, MonitorSnapshot};
pub use notify::{StatusChanged, StatusNotifier};
