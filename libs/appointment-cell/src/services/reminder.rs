// libs/appointment-cell/src/services/reminder.rs
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, Reminder, ReminderError};

/// Derives and tracks at most one reminder per appointment.
#[derive(Debug)]
pub struct ReminderScheduler {
    lead_time: Duration,
    reminders: HashMap<Uuid, Reminder>,
}

impl ReminderScheduler {
    pub fn new(lead_time: Duration) -> Self {
        Self {
            lead_time,
            reminders: HashMap::new(),
        }
    }

    /// Creates the reminder for `appointment` if its fire time is still ahead
    /// of `now`. Appointments booked inside the lead window get none.
    pub fn schedule_for(
        &mut self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<Option<Reminder>, ReminderError> {
        let appointment_at = appointment.scheduled_at()?;
        let fire_at = appointment_at.checked_sub_signed(self.lead_time).ok_or_else(|| {
            ReminderError::InvalidSchedule(format!(
                "{} is too early to subtract a {}h lead time",
                appointment_at,
                self.lead_time.num_hours()
            ))
        })?;

        if fire_at <= now {
            debug!(
                "Appointment {} at {} is inside the {}h lead window, no reminder",
                appointment.id,
                appointment_at,
                self.lead_time.num_hours()
            );
            return Ok(None);
        }

        let reminder = Reminder {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            doctor_id: appointment.doctor_id.clone(),
            contact: appointment.contact(),
            appointment_at,
            fire_at,
            sent: false,
            sent_at: None,
        };

        debug!("Reminder {} for appointment {} fires at {}", reminder.id, appointment.id, fire_at);
        self.reminders.insert(appointment.id, reminder.clone());
        Ok(Some(reminder))
    }

    /// Drops the reminder for an appointment, if there is one.
    pub fn cancel_for(&mut self, appointment_id: Uuid) -> Option<Reminder> {
        self.reminders.remove(&appointment_id)
    }

    pub fn due_reminders(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        self.reminders
            .values()
            .filter(|reminder| reminder.is_due(now))
            .cloned()
            .collect()
    }

    /// True while the given reminder is still stored for its appointment and unsent.
    pub fn is_pending(&self, appointment_id: Uuid, reminder_id: Uuid) -> bool {
        self.reminders
            .get(&appointment_id)
            .map(|reminder| reminder.id == reminder_id && !reminder.sent)
            .unwrap_or(false)
    }

    /// Sets the sent flag. Returns false if the reminder is gone or was already sent.
    pub fn mark_sent(&mut self, appointment_id: Uuid, reminder_id: Uuid, at: DateTime<Utc>) -> bool {
        match self.reminders.get_mut(&appointment_id) {
            Some(reminder) if reminder.id == reminder_id && !reminder.sent => {
                reminder.sent = true;
                reminder.sent_at = Some(at);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, appointment_id: Uuid) -> Option<Reminder> {
        self.reminders.get(&appointment_id).cloned()
    }

    pub fn list(&self) -> Vec<Reminder> {
        let mut reminders: Vec<Reminder> = self.reminders.values().cloned().collect();
        reminders.sort_by_key(|reminder| reminder.fire_at);
        reminders
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }
}
