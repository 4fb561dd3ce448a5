#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use appointment_cell::{
    AppointmentContext, BookAppointmentRequest, BookingService, DispatchConfig, NotificationError,
    NotificationSender, RecordingNotificationSender, Reminder, ReminderDispatcher,
};
use doctor_cell::InMemoryDoctorCatalog;
use shared_utils::test_utils::booking_day_clock;
use shared_utils::{Clock, ManualClock};

pub fn fast_dispatch_config() -> DispatchConfig {
    DispatchConfig {
        scan_interval: std::time::Duration::from_millis(50),
        run_on_startup: true,
        notification_timeout: None,
    }
}

/// Booking service, dispatcher and a recording sender wired around a manual
/// clock that starts at 2024-12-20 09:00 UTC.
pub struct TestHarness {
    pub clock: Arc<ManualClock>,
    pub booking: Arc<BookingService>,
    pub sender: Arc<RecordingNotificationSender>,
    pub dispatcher: Arc<ReminderDispatcher>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(fast_dispatch_config())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        let clock = booking_day_clock();
        let booking = Arc::new(BookingService::new(
            Arc::new(InMemoryDoctorCatalog::seeded()),
            clock.clone(),
            Duration::hours(24),
        ));
        let sender = Arc::new(RecordingNotificationSender::new());
        let dispatcher = Arc::new(ReminderDispatcher::new(
            Arc::clone(&booking),
            sender.clone(),
            config,
        ));

        Self {
            clock,
            booking,
            sender,
            dispatcher,
        }
    }

    /// Same wiring with a caller-supplied sender; `self.sender` stays unused.
    pub fn with_sender(sender: Arc<dyn NotificationSender>, config: DispatchConfig) -> Self {
        let mut harness = Self::with_config(config.clone());
        harness.dispatcher = Arc::new(ReminderDispatcher::new(
            Arc::clone(&harness.booking),
            sender,
            config,
        ));
        harness
    }

    pub fn context(&self) -> Arc<AppointmentContext> {
        Arc::new(AppointmentContext::new(
            Arc::clone(&self.booking),
            Arc::clone(&self.dispatcher),
        ))
    }
}

pub fn booking_request(date: &str, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: "1".to_string(),
        patient_name: "Jane Doe".to_string(),
        patient_email: "jane.doe@example.com".to_string(),
        patient_phone: "+1 555 010 0200".to_string(),
        date: date.to_string(),
        time: time.to_string(),
        reason: "Follow-up on blood pressure".to_string(),
    }
}

/// Blocks the first send until `release` is notified, reporting each
/// appointment id it is asked about on `started`.
pub struct GatedSender {
    pub started: mpsc::UnboundedSender<Uuid>,
    pub release: Notify,
    gated: AtomicBool,
}

impl GatedSender {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Uuid>) {
        let (started, receiver) = mpsc::unbounded_channel();
        let sender = Arc::new(Self {
            started,
            release: Notify::new(),
            gated: AtomicBool::new(true),
        });
        (sender, receiver)
    }
}

#[async_trait]
impl NotificationSender for GatedSender {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotificationError> {
        let _ = self.started.send(reminder.appointment_id);
        if self.gated.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        Ok(())
    }
}

pub struct PanickingSender;

#[async_trait]
impl NotificationSender for PanickingSender {
    async fn send(&self, _reminder: &Reminder) -> Result<(), NotificationError> {
        panic!("sender exploded");
    }
}

pub struct SlowSender;

#[async_trait]
impl NotificationSender for SlowSender {
    async fn send(&self, _reminder: &Reminder) -> Result<(), NotificationError> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(())
    }
}

/// Date and time strings for the instant `offset` after the clock's now.
pub fn slot_after(clock: &ManualClock, offset: Duration) -> (String, String) {
    let at = clock.now() + offset;
    (at.format("%Y-%m-%d").to_string(), at.format("%H:%M").to_string())
}
