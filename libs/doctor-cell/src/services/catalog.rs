use async_trait::async_trait;
use tracing::debug;

use crate::models::Doctor;

/// Read-only view of the doctor catalog used by the booking flow.
#[async_trait]
pub trait DoctorCatalog: Send + Sync {
    async fn get_doctor(&self, doctor_id: &str) -> Option<Doctor>;

    async fn list_doctors(&self) -> Vec<Doctor>;

    async fn doctor_exists(&self, doctor_id: &str) -> bool {
        self.get_doctor(doctor_id).await.is_some()
    }
}

/// Static catalog held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDoctorCatalog {
    doctors: Vec<Doctor>,
}

impl InMemoryDoctorCatalog {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }

    /// The clinic's default roster.
    pub fn seeded() -> Self {
        Self::new(vec![
            Doctor::new(
                "1",
                "Dr. Sarah Johnson",
                "Cardiology",
                &["09:00", "10:00", "11:00", "14:00", "15:00"],
            ),
            Doctor::new(
                "2",
                "Dr. Michael Chen",
                "Dermatology",
                &["09:30", "10:30", "13:00", "16:00"],
            ),
            Doctor::new(
                "3",
                "Dr. Emily Rodriguez",
                "Pediatrics",
                &["08:00", "09:00", "10:00", "11:00", "15:00", "16:00"],
            ),
        ])
    }
}

#[async_trait]
impl DoctorCatalog for InMemoryDoctorCatalog {
    async fn get_doctor(&self, doctor_id: &str) -> Option<Doctor> {
        let doctor = self.doctors.iter().find(|d| d.id == doctor_id).cloned();
        if doctor.is_none() {
            debug!("Doctor {} not in catalog", doctor_id);
        }
        doctor
    }

    async fn list_doctors(&self) -> Vec<Doctor> {
        self.doctors.clone()
    }
}
