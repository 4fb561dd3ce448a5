// libs/appointment-cell/src/services/dispatch.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{DispatchReport, NotificationError, Reminder};
use crate::services::booking::BookingService;
use crate::services::notification::NotificationSender;

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub scan_interval: Duration,
    pub run_on_startup: bool,
    /// Upper bound on a single notification attempt. `None` waits indefinitely.
    pub notification_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for DispatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            scan_interval: config.scan_interval(),
            run_on_startup: config.reminder_run_on_startup,
            notification_timeout: config.notification_timeout(),
        }
    }
}

/// Periodically fires due reminders, at most once each.
pub struct ReminderDispatcher {
    booking: Arc<BookingService>,
    sender: Arc<dyn NotificationSender>,
    config: DispatchConfig,
    scan_lock: Mutex<()>,
}

impl ReminderDispatcher {
    pub fn new(
        booking: Arc<BookingService>,
        sender: Arc<dyn NotificationSender>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            booking,
            sender,
            config,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// One pass at the clock's current time.
    pub async fn run_scan(&self) -> DispatchReport {
        let now = self.booking.clock().now();
        self.run_scan_at(now).await
    }

    /// One pass at `now`. The due set is read under the booking lock, which is
    /// released for each send and taken again only to set the sent flag.
    /// Failed sends are still marked sent and never retried.
    #[instrument(skip(self))]
    pub async fn run_scan_at(&self, now: DateTime<Utc>) -> DispatchReport {
        let _scan = self.scan_lock.lock().await;

        let due = self.booking.due_reminders(now).await;
        let mut report = DispatchReport::new(now, due.len());

        for reminder in due {
            if !self.booking.is_reminder_pending(&reminder).await {
                debug!("Reminder {} withdrawn before sending, skipping", reminder.id);
                report.skipped += 1;
                continue;
            }

            let outcome = self.deliver(&reminder).await;

            if !self.booking.mark_reminder_sent(&reminder, now).await {
                debug!("Reminder {} was withdrawn while being sent", reminder.id);
            }

            match outcome {
                Ok(()) => {
                    debug!("Reminder {} sent for appointment {}", reminder.id, reminder.appointment_id);
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(
                        "Reminder {} for appointment {} not delivered, will not retry: {}",
                        reminder.id, reminder.appointment_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        if report.due > 0 {
            info!(
                "Reminder scan at {}: {} due, {} sent, {} failed, {} skipped",
                now, report.due, report.sent, report.failed, report.skipped
            );
        } else {
            debug!("Reminder scan at {}: nothing due", now);
        }

        report
    }

    /// Runs the send on its own task so a panicking sender cannot take the
    /// loop down with it.
    async fn deliver(&self, reminder: &Reminder) -> Result<(), NotificationError> {
        let sender = Arc::clone(&self.sender);
        let owned = reminder.clone();
        let mut attempt = tokio::spawn(async move { sender.send(&owned).await });

        let joined = match self.config.notification_timeout {
            Some(limit) => match timeout(limit, &mut attempt).await {
                Ok(joined) => joined,
                Err(_) => {
                    attempt.abort();
                    return Err(NotificationError::Timeout(limit));
                }
            },
            None => attempt.await,
        };

        joined.map_err(|e| NotificationError::Delivery(format!("notification task failed: {}", e)))?
    }

    /// Scans every `scan_interval` until `shutdown` flips to true. A scan in
    /// progress always runs to completion.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.scan_interval;
        let start = if self.config.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Reminder dispatch loop started, scanning every {:?}", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_scan().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reminder dispatch loop stopped");
    }

    pub fn spawn(self: Arc<Self>) -> DispatchHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        DispatchHandle { shutdown, task }
    }
}

/// Owner of a running dispatch loop.
pub struct DispatchHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DispatchHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the loop and waits for the current scan to finish.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            debug!("Dispatch loop already gone");
        }
        if let Err(e) = self.task.await {
            error!("Dispatch loop ended abnormally: {}", e);
        }
    }
}
