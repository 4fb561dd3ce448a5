// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest};

/// Active appointments keyed by id. Listing follows insertion order.
///
/// Holds no lock of its own: callers share it through `BookingService`,
/// which keeps it and the reminder schedule behind a single mutex.
#[derive(Debug, Default)]
pub struct AppointmentStore {
    appointments: HashMap<Uuid, Appointment>,
    order: Vec<Uuid>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a confirmed appointment under a fresh v4 id. Doctor existence
    /// is checked by the caller before the store is touched.
    pub fn create(&mut self, request: BookAppointmentRequest, created_at: DateTime<Utc>) -> Appointment {
        let mut id = Uuid::new_v4();
        while self.appointments.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let appointment = Appointment {
            id,
            doctor_id: request.doctor_id,
            patient_name: request.patient_name,
            patient_email: request.patient_email,
            patient_phone: request.patient_phone,
            date: request.date,
            time: request.time,
            reason: request.reason,
            status: AppointmentStatus::Confirmed,
            created_at,
        };

        self.appointments.insert(id, appointment.clone());
        self.order.push(id);
        debug!("Stored appointment {} ({} active)", id, self.order.len());
        appointment
    }

    /// Removes the appointment and hands it back marked cancelled.
    pub fn cancel(&mut self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .appointments
            .remove(&id)
            .ok_or(AppointmentError::NotFound(id))?;
        self.order.retain(|existing| *existing != id);
        appointment.status = AppointmentStatus::Cancelled;
        Ok(appointment)
    }

    pub fn get(&self, id: Uuid) -> Option<Appointment> {
        self.appointments.get(&id).cloned()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.appointments.contains_key(&id)
    }

    pub fn list(&self) -> Vec<Appointment> {
        self.order
            .iter()
            .filter_map(|id| self.appointments.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(name: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: "1".to_string(),
            patient_name: name.to_string(),
            patient_email: format!("{}@example.com", name.to_lowercase()),
            patient_phone: "555-0100".to_string(),
            date: "2024-12-25".to_string(),
            time: "10:00".to_string(),
            reason: "Checkup".to_string(),
        }
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 20, 9, 0, 0).unwrap()
    }

    #[test]
    fn create_then_get_returns_confirmed_copy() {
        let mut store = AppointmentStore::new();
        let created = store.create(request("Alice"), created_at());

        let fetched = store.get(created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, AppointmentStatus::Confirmed);
        assert_eq!(fetched.patient_name, "Alice");
        assert_eq!(fetched.created_at, created_at());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut store = AppointmentStore::new();
        let a = store.create(request("Alice"), created_at());
        let b = store.create(request("Bob"), created_at());
        let c = store.create(request("Carol"), created_at());

        store.cancel(b.id).unwrap();

        let ids: Vec<Uuid> = store.list().into_iter().map(|appt| appt.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn cancel_removes_and_marks_cancelled() {
        let mut store = AppointmentStore::new();
        let created = store.create(request("Alice"), created_at());

        let cancelled = store.cancel(created.id).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert!(store.get(created.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn cancel_unknown_is_not_found() {
        let mut store = AppointmentStore::new();
        store.create(request("Alice"), created_at());
        let missing = Uuid::new_v4();

        assert_eq!(store.cancel(missing), Err(AppointmentError::NotFound(missing)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let mut store = AppointmentStore::new();
        let a = store.create(request("Alice"), created_at());
        let b = store.create(request("Alice"), created_at());
        assert_ne!(a.id, b.id);
    }
}
