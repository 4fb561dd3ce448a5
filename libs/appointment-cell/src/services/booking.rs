// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::DoctorCatalog;
use shared_utils::Clock;

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, Reminder};
use crate::services::reminder::ReminderScheduler;
use crate::services::store::AppointmentStore;

/// Appointments and their reminders, always mutated together.
#[derive(Debug)]
struct BookingLedger {
    appointments: AppointmentStore,
    reminders: ReminderScheduler,
}

/// Entry point for booking and cancelling. Owns the only lock over appointment
/// and reminder state, so a half-applied booking or cancellation is never visible.
pub struct BookingService {
    catalog: Arc<dyn DoctorCatalog>,
    clock: Arc<dyn Clock>,
    ledger: Mutex<BookingLedger>,
}

impl BookingService {
    pub fn new(catalog: Arc<dyn DoctorCatalog>, clock: Arc<dyn Clock>, lead_time: Duration) -> Self {
        Self {
            catalog,
            clock,
            ledger: Mutex::new(BookingLedger {
                appointments: AppointmentStore::new(),
                reminders: ReminderScheduler::new(lead_time),
            }),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn catalog(&self) -> &Arc<dyn DoctorCatalog> {
        &self.catalog
    }

    /// Books an appointment and derives its reminder. A reminder that cannot
    /// be derived is logged and does not fail the booking.
    pub async fn create_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book(request).await.map(|(appointment, _)| appointment)
    }

    /// Like `create_appointment`, also returning the reminder derived under
    /// the same lock acquisition.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<(Appointment, Option<Reminder>), AppointmentError> {
        if !self.catalog.doctor_exists(&request.doctor_id).await {
            return Err(AppointmentError::DoctorNotFound(request.doctor_id));
        }

        let now = self.clock.now();
        let mut ledger = self.ledger.lock().await;
        let appointment = ledger.appointments.create(request, now);

        let reminder = match ledger.reminders.schedule_for(&appointment, now) {
            Ok(Some(reminder)) => {
                info!(
                    "Appointment {} booked with doctor {}, reminder due at {}",
                    appointment.id, appointment.doctor_id, reminder.fire_at
                );
                Some(reminder)
            }
            Ok(None) => {
                info!(
                    "Appointment {} booked with doctor {} inside the reminder lead window, no reminder scheduled",
                    appointment.id, appointment.doctor_id
                );
                None
            }
            Err(e) => {
                warn!("Appointment {} booked without reminder: {}", appointment.id, e);
                None
            }
        };

        Ok((appointment, reminder))
    }

    /// Removes the appointment and its reminder under one lock acquisition.
    pub async fn cancel_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let mut ledger = self.ledger.lock().await;
        let cancelled = ledger.appointments.cancel(appointment_id)?;
        let dropped = ledger.reminders.cancel_for(appointment_id);

        info!(
            "Appointment {} cancelled{}",
            appointment_id,
            if dropped.is_some() { ", reminder withdrawn" } else { "" }
        );
        Ok(cancelled)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);
        self.ledger
            .lock()
            .await
            .appointments
            .get(appointment_id)
            .ok_or(AppointmentError::NotFound(appointment_id))
    }

    pub async fn list_appointments(&self) -> Vec<Appointment> {
        self.ledger.lock().await.appointments.list()
    }

    pub async fn reminder_for(&self, appointment_id: Uuid) -> Result<Option<Reminder>, AppointmentError> {
        let ledger = self.ledger.lock().await;
        if !ledger.appointments.contains(appointment_id) {
            return Err(AppointmentError::NotFound(appointment_id));
        }
        Ok(ledger.reminders.get(appointment_id))
    }

    pub async fn list_reminders(&self) -> Vec<Reminder> {
        self.ledger.lock().await.reminders.list()
    }

    /// Unsent reminders whose fire time has passed and whose appointment still exists.
    pub async fn due_reminders(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let ledger = self.ledger.lock().await;
        ledger
            .reminders
            .due_reminders(now)
            .into_iter()
            .filter(|reminder| ledger.appointments.contains(reminder.appointment_id))
            .collect()
    }

    pub async fn is_reminder_pending(&self, reminder: &Reminder) -> bool {
        let ledger = self.ledger.lock().await;
        ledger.appointments.contains(reminder.appointment_id)
            && ledger.reminders.is_pending(reminder.appointment_id, reminder.id)
    }

    pub async fn mark_reminder_sent(&self, reminder: &Reminder, at: DateTime<Utc>) -> bool {
        self.ledger
            .lock()
            .await
            .reminders
            .mark_sent(reminder.appointment_id, reminder.id, at)
    }
}
