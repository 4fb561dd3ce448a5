// libs/appointment-cell/src/services/notification.rs
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::{NotificationError, Reminder};

/// Delivers a reminder to the patient. Called from the dispatch loop only,
/// never while the booking lock is held.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotificationError>;
}

/// Stand-in for real email/SMS delivery: writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotificationError> {
        info!(
            "Reminder {} -> {} <{}>, {}: {}",
            reminder.id,
            reminder.contact.name,
            reminder.contact.email,
            reminder.contact.phone,
            reminder.message()
        );
        Ok(())
    }
}

/// Posts each reminder as JSON to a configured URL.
pub struct WebhookNotificationSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotificationSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookNotificationSender {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotificationError> {
        let payload = json!({
            "reminder_id": reminder.id,
            "appointment_id": reminder.appointment_id,
            "doctor_id": reminder.doctor_id,
            "patient": reminder.contact,
            "appointment_at": reminder.appointment_at,
            "message": reminder.message(),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

/// Test double that remembers every reminder it was asked to send and can be
/// switched into failing mode.
#[derive(Debug, Default)]
pub struct RecordingNotificationSender {
    sent: Mutex<Vec<Reminder>>,
    failing: Mutex<bool>,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sender = Self::default();
        sender.set_failing(true);
        sender
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|e| e.into_inner()) = failing;
    }

    pub fn sent(&self) -> Vec<Reminder> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count_for(&self, appointment_id: Uuid) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|reminder| reminder.appointment_id == appointment_id)
            .count()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(reminder.clone());

        if *self.failing.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(NotificationError::Delivery("recording sender set to fail".to_string()));
        }
        Ok(())
    }
}
