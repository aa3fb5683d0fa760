// libs/notification-cell/src/services/dispatcher.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use chrono::Duration as ChronoDuration;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::models::{ReminderSettings, TickOutcome, TickReport};
use crate::services::clock::Clock;
use crate::services::delivery::DeliveryWorker;
use crate::services::store::NotificationStore;

/// Periodically drains due notifications. At most one tick body runs at any
/// instant within a process; a timer fire that overlaps a running cycle is
/// skipped, not queued. The guard is process-local: running several
/// instances of this service against one store requires an external lock.
pub struct ReminderDispatchService {
    store: Arc<NotificationStore>,
    worker: Arc<DeliveryWorker>,
    clock: Arc<dyn Clock>,
    settings: ReminderSettings,
    in_flight: AtomicBool,
    is_shutdown: RwLock<bool>,
}

/// Releases the single-flight flag when the tick body ends, on every exit
/// path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReminderDispatchService {
    pub fn new(
        store: Arc<NotificationStore>,
        worker: Arc<DeliveryWorker>,
        clock: Arc<dyn Clock>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            store,
            worker,
            clock,
            settings,
            in_flight: AtomicBool::new(false),
            is_shutdown: RwLock::new(false),
        }
    }

    pub async fn start(&self) {
        info!(
            "Starting reminder dispatcher (every {}s, batch size {})",
            self.settings.dispatch_interval_seconds, self.settings.max_batch
        );

        let mut ticker = interval(Duration::from_secs(self.settings.dispatch_interval_seconds));

        loop {
            ticker.tick().await;

            if *self.is_shutdown.read().await {
                break;
            }

            match self.run_tick().await {
                TickOutcome::Completed(report) => {
                    if report.claimed > 0 || report.stale_reclaimed > 0 {
                        info!(
                            "Dispatch tick: reclaimed {}, claimed {}, sent {}, failed {}",
                            report.stale_reclaimed, report.claimed, report.sent, report.failed
                        );
                    } else {
                        debug!("Dispatch tick: no due notifications");
                    }
                }
                TickOutcome::Skipped => {}
                TickOutcome::Aborted(e) => {
                    warn!("Dispatch tick aborted: {}", e);
                }
            }
        }

        info!("Reminder dispatcher stopped");
    }

    pub async fn shutdown(&self) {
        let mut is_shutdown = self.is_shutdown.write().await;
        *is_shutdown = true;
    }

    /// One dispatch cycle: reset stale claims, claim a batch of due records,
    /// deliver each one. Per-item failures never abort the batch; a store
    /// failure before dispatching aborts the whole tick and the next tick
    /// retries from scratch.
    pub async fn run_tick(&self) -> TickOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            debug!("Previous dispatch cycle still running, skipping tick");
            return TickOutcome::Skipped;
        }
        let _guard = FlightGuard(&self.in_flight);

        let now = self.clock.now();
        let stale_cutoff = now - ChronoDuration::minutes(self.settings.processing_timeout_minutes);

        let stale_reclaimed = match self.store.release_stale(stale_cutoff, now).await {
            Ok(count) => {
                if count > 0 {
                    warn!("Reset {} stale claims back to pending", count);
                }
                count
            }
            Err(e) => {
                error!("Failed to reset stale claims: {}", e);
                return TickOutcome::Aborted(e);
            }
        };

        let batch = match self.store.claim_due(now, self.settings.max_batch).await {
            Ok(batch) => batch,
            Err(e) => {
                error!("Failed to claim due notifications: {}", e);
                return TickOutcome::Aborted(e);
            }
        };

        let mut report = TickReport {
            stale_reclaimed,
            claimed: batch.len(),
            ..TickReport::default()
        };

        for record in &batch {
            match self.worker.deliver(record).await {
                Ok(()) => {
                    match self.store.mark_sent(record.id, self.clock.now()).await {
                        Ok(()) => report.sent += 1,
                        Err(e) => {
                            // Still claimed; the reclaimer retries it after the
                            // timeout, which may duplicate this delivery.
                            warn!("Failed to confirm notification {} as sent: {}", record.id, e);
                        }
                    }
                }
                Err(e) => {
                    warn!("Notification {} failed: {}", record.id, e);
                    report.failed += 1;
                    if let Err(store_err) = self.store.mark_failed(record.id, self.clock.now()).await {
                        warn!(
                            "Failed to record failure for notification {}: {}",
                            record.id, store_err
                        );
                    }
                }
            }
        }

        TickOutcome::Completed(report)
    }
}
