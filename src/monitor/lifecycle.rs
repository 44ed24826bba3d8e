// Lifecycle Monitor - enrollment, renewal, exchange, and OCSP polling

use crate::monitor::config::MonitorSettings;
use crate::monitor::notify::StatusNotifier;
use crate::service::CertificateService;
use crate::types::{Certificate, CertificateConfig, EnrollmentOutcome};
use crate::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Drives the device identity certificate through its lifecycle.
///
/// A recurring tick consults the certificate service for configuration and
/// due times, re-checks the identity certificate's revocation status, and
/// triggers renewal or exchange when due. Exactly one tick is ever in
/// flight, and a failing tick is logged, never allowed to stop the loop.
///
/// Pending enrollments are polled through a single cancellable delayed
/// continuation: arming a new delay (or processing a new outcome) always
/// cancels the previous one first, so at most one is outstanding per
/// monitor instance.
pub struct LifecycleMonitor<S> {
    service: Arc<S>,
    settings: MonitorSettings,
    notifier: StatusNotifier,
    running: AtomicBool,
    next_ocsp_check: Mutex<DateTime<Utc>>,
    // The single delayed continuation slot: either a pending-enrollment
    // poll or an exchange deferred until the renewed certificate becomes
    // valid. Replacing the slot aborts the previous task.
    delayed: Mutex<Option<JoinHandle<()>>>,
    // Handle to ourselves for delayed continuations; a disposed monitor
    // fails the upgrade and the continuation becomes a no-op.
    me: Weak<Self>,
}

/// Point-in-time diagnostic view of the monitor.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub running: bool,
    pub next_ocsp_check: DateTime<Utc>,
    pub delayed_armed: bool,
}

impl<S: CertificateService + 'static> LifecycleMonitor<S> {
    pub fn new(service: Arc<S>, settings: MonitorSettings) -> Arc<Self> {
        let notifier = StatusNotifier::new(settings.notification_capacity);
        Arc::new_cyclic(|me| Self {
            service,
            settings,
            notifier,
            running: AtomicBool::new(false),
            next_ocsp_check: Mutex::new(Utc::now()),
            delayed: Mutex::new(None),
            me: me.clone(),
        })
    }

    /// The status-changed notification source for observers.
    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Diagnostic snapshot of the monitor's scheduling state.
    pub async fn status_snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            running: self.is_running(),
            next_ocsp_check: *self.next_ocsp_check.lock().await,
            delayed_armed: self.delayed.lock().await.is_some(),
        }
    }

    /// Run the monitor loop until [`shutdown`](Self::shutdown) is called.
    ///
    /// The next tick is armed only after the current one completes, so
    /// renewal and exchange attempts never overlap.
    pub async fn run(&self) {
        tracing::info!("starting certificate lifecycle monitor");
        self.running.store(true, Ordering::SeqCst);

        let mut ticker = interval(self.settings.tick_interval);
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = self.tick().await {
                tracing::error!("lifecycle tick failed: {e:#}");
            }
        }

        tracing::info!("certificate lifecycle monitor stopped");
    }

    /// Stop the loop and cancel any armed delayed continuation.
    ///
    /// A tick that is already executing is allowed to finish but is not
    /// rescheduled afterwards.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down certificate lifecycle monitor");
        self.running.store(false, Ordering::SeqCst);
        self.cancel_delayed().await;
    }

    /// Execute one lifecycle check now.
    ///
    /// Public so hosts can force a check outside the regular schedule (for
    /// example after a configuration change).
    pub async fn tick(&self) -> Result<()> {
        let config = self.service.get_configuration().await?;
        if !config.scep_enabled {
            return Ok(());
        }

        self.check_own_status(&config).await;
        self.check_due_enrollment(&config).await;
        Ok(())
    }

    /// Re-check the identity certificate's revocation status when due.
    ///
    /// A failed check leaves the due time unchanged so the next tick
    /// retries; a tick is never failed by this step.
    async fn check_own_status(&self, config: &CertificateConfig) {
        if !config.ocsp_enabled {
            return;
        }

        let now = Utc::now();
        if now < *self.next_ocsp_check.lock().await {
            return;
        }

        match self.service.own_certificate_status(None).await {
            Ok(status) => {
                let next = status
                    .next_update
                    .unwrap_or_else(|| Utc::now() + self.ocsp_retry_interval());
                tracing::debug!(
                    status = ?status.status,
                    next_check = %next,
                    "identity certificate status checked"
                );
                *self.next_ocsp_check.lock().await = next;
            }
            Err(e) => {
                tracing::warn!("identity certificate status check failed: {e:#}");
            }
        }
    }

    fn ocsp_retry_interval(&self) -> ChronoDuration {
        ChronoDuration::from_std(self.settings.ocsp_retry_interval)
            .unwrap_or_else(|_| ChronoDuration::minutes(5))
    }

    /// Renewal takes precedence over exchange; at most one enrollment
    /// action runs per tick.
    async fn check_due_enrollment(&self, config: &CertificateConfig) {
        let now = Utc::now();
        if now >= self.service.next_renewal_time().await {
            self.renew(config).await;
        } else if now >= self.service.next_exchange_time().await {
            // Exchange the active certificate for the next scheduled one.
            if let Err(e) = self.service.exchange(None).await {
                tracing::warn!("certificate exchange failed: {e:#}");
            }
        }
    }

    /// Request renewal of the identity certificate and process the outcome.
    async fn renew(&self, config: &CertificateConfig) {
        tracing::info!("identity certificate renewal due, requesting renewal");
        let outcome = match self.service.renew().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("renewal request failed: {e:#}");
                EnrollmentOutcome::Error
            }
        };
        self.process_outcome(outcome, true, config.manual_polling_interval)
            .await;
    }

    /// Shared enrollment-outcome processor for renew and poll results.
    ///
    /// Cancels any outstanding delayed continuation before processing, and
    /// publishes exactly one status-changed notification per outcome.
    async fn process_outcome(
        &self,
        outcome: EnrollmentOutcome,
        is_renewal: bool,
        polling_interval: Duration,
    ) {
        self.cancel_delayed().await;
        self.notifier.publish(outcome.status());

        match outcome {
            EnrollmentOutcome::Error => {
                tracing::error!("enrollment attempt failed");
            }
            EnrollmentOutcome::Denied => {
                tracing::warn!("enrollment request denied; operator intervention required");
            }
            EnrollmentOutcome::Enrolled { certificate } => {
                let Some(certificate) = certificate else {
                    tracing::error!("enrollment reported success without a certificate");
                    return;
                };
                if is_renewal {
                    if Utc::now() >= certificate.not_before {
                        // Already valid: swap it in right away.
                        tracing::info!(
                            thumbprint = %certificate.thumbprint,
                            "renewed certificate is valid, exchanging now"
                        );
                        if let Err(e) = self.service.exchange(Some(certificate)).await {
                            tracing::warn!("exchange of renewed certificate failed: {e:#}");
                        }
                    } else {
                        self.arm_deferred_exchange(certificate).await;
                    }
                } else if let Err(e) = self.service.install_certificate(certificate, true).await {
                    tracing::error!("failed to install enrolled certificate: {e:#}");
                }
            }
            EnrollmentOutcome::Pending {
                request_data,
                signing_certificate,
            } => {
                self.arm_pending_poll(
                    request_data,
                    signing_certificate,
                    is_renewal,
                    polling_interval,
                )
                .await;
            }
        }
    }

    /// Boxed re-entry into the outcome processor, used by the delayed poll
    /// continuation. The indirection keeps the continuation's future type
    /// finite.
    fn process_outcome_boxed(
        self: Arc<Self>,
        outcome: EnrollmentOutcome,
        is_renewal: bool,
        polling_interval: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            self.process_outcome(outcome, is_renewal, polling_interval)
                .await;
        })
    }

    /// Arm the delayed continuation with a pending-enrollment poll.
    async fn arm_pending_poll(
        &self,
        request_data: Vec<u8>,
        signing_certificate: Certificate,
        is_renewal: bool,
        polling_interval: Duration,
    ) {
        tracing::info!(
            delay_secs = polling_interval.as_secs(),
            "enrollment pending, scheduling poll"
        );
        let weak = self.me.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(polling_interval).await;
            let Some(monitor) = weak.upgrade() else {
                return;
            };
            // The delay has fired: release our own slot first so outcome
            // processing does not cancel the continuation running it.
            monitor.delayed.lock().await.take();

            tracing::debug!("polling pending enrollment request");
            let outcome = match monitor
                .service
                .poll(&request_data, &signing_certificate)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("pending enrollment poll failed: {e:#}");
                    EnrollmentOutcome::Error
                }
            };
            monitor
                .process_outcome_boxed(outcome, is_renewal, polling_interval)
                .await;
        });
        self.replace_delayed(handle).await;
    }

    /// Arm the delayed continuation with an exchange scheduled for the
    /// moment the renewed certificate becomes valid.
    async fn arm_deferred_exchange(&self, certificate: Certificate) {
        let wait = (certificate.not_before - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        tracing::info!(
            not_before = %certificate.not_before,
            "renewed certificate not yet valid, scheduling exchange"
        );
        let weak = self.me.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let Some(monitor) = weak.upgrade() else {
                return;
            };
            monitor.delayed.lock().await.take();
            if let Err(e) = monitor.service.exchange(Some(certificate)).await {
                tracing::warn!("deferred certificate exchange failed: {e:#}");
            }
        });
        self.replace_delayed(handle).await;
    }

    async fn cancel_delayed(&self) {
        if let Some(handle) = self.delayed.lock().await.take() {
            handle.abort();
        }
    }

    async fn replace_delayed(&self, handle: JoinHandle<()>) {
        let mut slot = self.delayed.lock().await;
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CertificateStatusResult, EnrollmentStatus, RevocationStatus};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct Calls {
        renew: AtomicUsize,
        exchange: AtomicUsize,
        poll: AtomicUsize,
    }

    struct MockService {
        calls: Calls,
        config: AsyncMutex<CertificateConfig>,
        renew_outcomes: AsyncMutex<VecDeque<EnrollmentOutcome>>,
        poll_outcomes: AsyncMutex<VecDeque<EnrollmentOutcome>>,
        own_status: AsyncMutex<Option<CertificateStatusResult>>,
        next_renewal: AsyncMutex<DateTime<Utc>>,
        next_exchange: AsyncMutex<DateTime<Utc>>,
        exchanged: AsyncMutex<Vec<Option<Certificate>>>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                calls: Calls::default(),
                config: AsyncMutex::new(CertificateConfig {
                    scep_enabled: true,
                    ocsp_enabled: false,
                    validate_domain: true,
                    manual_polling_interval: Duration::from_millis(10),
                }),
                renew_outcomes: AsyncMutex::new(VecDeque::new()),
                poll_outcomes: AsyncMutex::new(VecDeque::new()),
                own_status: AsyncMutex::new(None),
                next_renewal: AsyncMutex::new(Utc::now() + ChronoDuration::days(30)),
                next_exchange: AsyncMutex::new(Utc::now() + ChronoDuration::days(30)),
                exchanged: AsyncMutex::new(Vec::new()),
            }
        }

        async fn renewal_due_with(self, outcome: EnrollmentOutcome) -> Self {
            *self.next_renewal.lock().await = Utc::now() - ChronoDuration::minutes(1);
            self.renew_outcomes.lock().await.push_back(outcome);
            self
        }

        async fn set_config(&self, config: CertificateConfig) {
            *self.config.lock().await = config;
        }

        fn renew_calls(&self) -> usize {
            self.calls.renew.load(Ordering::SeqCst)
        }

        fn exchange_calls(&self) -> usize {
            self.calls.exchange.load(Ordering::SeqCst)
        }

        fn poll_calls(&self) -> usize {
            self.calls.poll.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CertificateService for MockService {
        async fn get_configuration(&self) -> crate::Result<CertificateConfig> {
            Ok(self.config.lock().await.clone())
        }

        async fn renew(&self) -> crate::Result<EnrollmentOutcome> {
            self.calls.renew.fetch_add(1, Ordering::SeqCst);
            // Renewal is no longer due once attempted.
            *self.next_renewal.lock().await = Utc::now() + ChronoDuration::days(30);
            Ok(self
                .renew_outcomes
                .lock()
                .await
                .pop_front()
                .unwrap_or(EnrollmentOutcome::Error))
        }

        async fn exchange(&self, certificate: Option<Certificate>) -> crate::Result<()> {
            self.calls.exchange.fetch_add(1, Ordering::SeqCst);
            *self.next_exchange.lock().await = Utc::now() + ChronoDuration::days(30);
            self.exchanged.lock().await.push(certificate);
            Ok(())
        }

        async fn poll(
            &self,
            _request_data: &[u8],
            _signing_certificate: &Certificate,
        ) -> crate::Result<EnrollmentOutcome> {
            self.calls.poll.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .poll_outcomes
                .lock()
                .await
                .pop_front()
                .unwrap_or(EnrollmentOutcome::Error))
        }

        async fn install_certificate(
            &self,
            _certificate: Certificate,
            _is_new_enrollment: bool,
        ) -> crate::Result<()> {
            Ok(())
        }

        async fn own_certificate_status(
            &self,
            _hint: Option<&CertificateStatusResult>,
        ) -> crate::Result<CertificateStatusResult> {
            match self.own_status.lock().await.clone() {
                Some(result) => Ok(result),
                None => anyhow::bail!("status responder unreachable"),
            }
        }

        async fn peer_certificate_status(
            &self,
            _certificate: &Certificate,
            _hint: Option<&CertificateStatusResult>,
        ) -> crate::Result<CertificateStatusResult> {
            unimplemented!("not used by the lifecycle monitor")
        }

        async fn next_renewal_time(&self) -> DateTime<Utc> {
            *self.next_renewal.lock().await
        }

        async fn next_exchange_time(&self) -> DateTime<Utc> {
            *self.next_exchange.lock().await
        }
    }

    fn cert_valid_since(not_before: DateTime<Utc>) -> Certificate {
        Certificate {
            thumbprint: "12".repeat(32),
            subject: "CN=device-01".to_string(),
            not_before,
            not_after: not_before + ChronoDuration::days(365),
            subject_alt_names: vec!["device-01.example.com".to_string()],
            raw: Vec::new(),
        }
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            tick_interval: Duration::from_millis(10),
            ocsp_retry_interval: Duration::from_secs(300),
            notification_capacity: 16,
        }
    }

    fn ocsp_config(polling_interval: Duration) -> CertificateConfig {
        CertificateConfig {
            scep_enabled: true,
            ocsp_enabled: true,
            validate_domain: true,
            manual_polling_interval: polling_interval,
        }
    }

    fn slow_poll_config() -> CertificateConfig {
        CertificateConfig {
            scep_enabled: true,
            ocsp_enabled: false,
            validate_domain: true,
            // Long enough that the poll never fires during a test.
            manual_polling_interval: Duration::from_secs(3600),
        }
    }

    #[tokio::test]
    async fn test_disabled_scep_skips_everything() {
        let service = MockService::new();
        service
            .set_config(CertificateConfig {
                scep_enabled: false,
                ..CertificateConfig::default()
            })
            .await;
        *service.next_renewal.lock().await = Utc::now() - ChronoDuration::minutes(1);

        let service = Arc::new(service);
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();
        assert_eq!(service.renew_calls(), 0);
        assert_eq!(service.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_renewed_certificate_already_valid_exchanges_in_same_tick() {
        let issued = cert_valid_since(Utc::now() - ChronoDuration::days(1));
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Enrolled {
                    certificate: Some(issued.clone()),
                })
                .await,
        );
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();

        assert_eq!(service.renew_calls(), 1);
        assert_eq!(service.exchange_calls(), 1);
        let exchanged = service.exchanged.lock().await;
        assert_eq!(
            exchanged[0].as_ref().map(|c| c.thumbprint.clone()),
            Some(issued.thumbprint)
        );
    }

    #[tokio::test]
    async fn test_renewed_certificate_not_yet_valid_defers_exchange() {
        let issued = cert_valid_since(Utc::now() + ChronoDuration::days(1));
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Enrolled {
                    certificate: Some(issued),
                })
                .await,
        );
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();

        assert_eq!(service.exchange_calls(), 0);
        assert!(monitor.status_snapshot().await.delayed_armed);
    }

    #[tokio::test]
    async fn test_enrolled_without_certificate_is_logged_not_fatal() {
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Enrolled { certificate: None })
                .await,
        );
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();
        assert_eq!(service.exchange_calls(), 0);
        assert!(!monitor.status_snapshot().await.delayed_armed);
    }

    #[tokio::test]
    async fn test_exchange_due_without_renewal_exchanges_active_certificate() {
        let service = MockService::new();
        *service.next_exchange.lock().await = Utc::now() - ChronoDuration::minutes(1);
        let service = Arc::new(service);
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();

        assert_eq!(service.renew_calls(), 0);
        assert_eq!(service.exchange_calls(), 1);
        assert!(service.exchanged.lock().await[0].is_none());
    }

    #[tokio::test]
    async fn test_denied_outcome_publishes_notification() {
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Denied)
                .await,
        );
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());
        let mut rx = monitor.notifier().subscribe();

        monitor.tick().await.unwrap();

        assert_eq!(rx.recv().await.unwrap().status, EnrollmentStatus::Denied);
    }

    #[tokio::test]
    async fn test_pending_outcome_arms_single_poll() {
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Pending {
                    request_data: vec![1, 2, 3],
                    signing_certificate: cert_valid_since(Utc::now()),
                })
                .await,
        );
        service.set_config(slow_poll_config()).await;
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();
        assert!(monitor.status_snapshot().await.delayed_armed);
        assert_eq!(service.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_new_enrollment_attempt_cancels_outstanding_poll() {
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Pending {
                    request_data: vec![1],
                    signing_certificate: cert_valid_since(Utc::now()),
                })
                .await,
        );
        service.set_config(slow_poll_config()).await;
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();
        assert!(monitor.status_snapshot().await.delayed_armed);

        // Renewal becomes due again; the new outcome processing must first
        // cancel the outstanding poll delay.
        *service.next_renewal.lock().await = Utc::now() - ChronoDuration::minutes(1);
        service
            .renew_outcomes
            .lock()
            .await
            .push_back(EnrollmentOutcome::Denied);

        monitor.tick().await.unwrap();
        assert!(!monitor.status_snapshot().await.delayed_armed);
        assert_eq!(service.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_pending_poll_fires_and_processes_outcome() {
        let issued = cert_valid_since(Utc::now() - ChronoDuration::days(1));
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Pending {
                    request_data: vec![9, 9],
                    signing_certificate: cert_valid_since(Utc::now()),
                })
                .await,
        );
        service
            .poll_outcomes
            .lock()
            .await
            .push_back(EnrollmentOutcome::Enrolled {
                certificate: Some(issued),
            });
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());
        let mut rx = monitor.notifier().subscribe();

        monitor.tick().await.unwrap();

        // Wait out the 10ms polling interval.
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(service.poll_calls(), 1);
        assert_eq!(service.exchange_calls(), 1);
        assert_eq!(rx.recv().await.unwrap().status, EnrollmentStatus::Pending);
        assert_eq!(rx.recv().await.unwrap().status, EnrollmentStatus::Enrolled);
    }

    #[tokio::test]
    async fn test_ocsp_success_advances_due_time() {
        let service = MockService::new();
        service.set_config(ocsp_config(Duration::from_secs(60))).await;
        let next_update = Utc::now() + ChronoDuration::hours(6);
        *service.own_status.lock().await = Some(CertificateStatusResult {
            status: RevocationStatus::Good,
            verified_at: Utc::now(),
            next_update: Some(next_update),
            offline_since: None,
        });
        let service = Arc::new(service);
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        monitor.tick().await.unwrap();

        let snapshot = monitor.status_snapshot().await;
        assert_eq!(snapshot.next_ocsp_check, next_update);
    }

    #[tokio::test]
    async fn test_ocsp_without_next_update_uses_retry_interval() {
        let service = MockService::new();
        service.set_config(ocsp_config(Duration::from_secs(60))).await;
        *service.own_status.lock().await = Some(CertificateStatusResult {
            status: RevocationStatus::Good,
            verified_at: Utc::now(),
            next_update: None,
            offline_since: None,
        });
        let service = Arc::new(service);
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        let before = Utc::now();
        monitor.tick().await.unwrap();

        let snapshot = monitor.status_snapshot().await;
        assert!(snapshot.next_ocsp_check >= before + ChronoDuration::minutes(4));
        assert!(snapshot.next_ocsp_check <= Utc::now() + ChronoDuration::minutes(6));
    }

    #[tokio::test]
    async fn test_ocsp_failure_leaves_due_time_and_reaches_renewal_step() {
        let service = MockService::new();
        service.set_config(ocsp_config(Duration::from_secs(60))).await;
        // own_status not programmed: the status check errors.
        *service.next_renewal.lock().await = Utc::now() - ChronoDuration::minutes(1);
        service
            .renew_outcomes
            .lock()
            .await
            .push_back(EnrollmentOutcome::Denied);
        let service = Arc::new(service);
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        let due_before = monitor.status_snapshot().await.next_ocsp_check;
        monitor.tick().await.unwrap();

        // The failed OCSP step neither failed the tick nor blocked renewal.
        assert_eq!(service.renew_calls(), 1);
        assert_eq!(monitor.status_snapshot().await.next_ocsp_check, due_before);

        // The monitor stays alive for subsequent ticks.
        monitor.tick().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_cancels_delay_and_stops_loop() {
        let service = Arc::new(
            MockService::new()
                .renewal_due_with(EnrollmentOutcome::Pending {
                    request_data: vec![7],
                    signing_certificate: cert_valid_since(Utc::now()),
                })
                .await,
        );
        service.set_config(slow_poll_config()).await;
        let monitor = LifecycleMonitor::new(Arc::clone(&service), settings());

        let runner = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move { monitor.run().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(monitor.is_running());
        assert!(monitor.status_snapshot().await.delayed_armed);

        monitor.shutdown().await;
        tokio::time::timeout(Duration::from_secs(1), runner)
            .await
            .expect("run loop should exit after shutdown")
            .unwrap();

        let snapshot = monitor.status_snapshot().await;
        assert!(!snapshot.running);
        assert!(!snapshot.delayed_armed);
        assert_eq!(service.poll_calls(), 0);
    }
}
