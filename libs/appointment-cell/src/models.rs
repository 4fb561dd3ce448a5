// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use shared_models::error::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

const MAX_EMAIL_LEN: usize = 254;
const MIN_PHONE_DIGITS: usize = 7;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

// Optional leading +, then digits with space, dash, dot or bracket separators.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9(][0-9\s\-.()]{4,22}[0-9]$").unwrap()
});

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    /// `YYYY-MM-DD`, as supplied by the caller.
    pub date: String,
    /// `HH:MM`, one of the doctor's slots.
    pub time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// The appointment's wall-clock start, read as UTC.
    pub fn scheduled_at(&self) -> Result<DateTime<Utc>, ReminderError> {
        parse_schedule(&self.date, &self.time)
    }

    pub fn contact(&self) -> PatientContact {
        PatientContact {
            name: self.patient_name.clone(),
            email: self.patient_email.clone(),
            phone: self.patient_phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub reason: String,
}

impl BookAppointmentRequest {
    /// Field-level checks performed at the HTTP boundary. The booking service
    /// itself trusts its caller and does not repeat them.
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.doctor_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("doctor_id is required".to_string()));
        }
        if self.patient_name.trim().is_empty() {
            return Err(AppointmentError::ValidationError("patient_name is required".to_string()));
        }
        if !is_valid_email(&self.patient_email) {
            return Err(AppointmentError::ValidationError(format!(
                "patient_email '{}' is not a valid email address",
                self.patient_email
            )));
        }
        if !is_valid_phone(&self.patient_phone) {
            return Err(AppointmentError::ValidationError(format!(
                "patient_phone '{}' is not a valid phone number",
                self.patient_phone
            )));
        }
        if NaiveDate::parse_from_str(&self.date, DATE_FORMAT).is_err() {
            return Err(AppointmentError::ValidationError(format!(
                "date '{}' must be formatted as YYYY-MM-DD",
                self.date
            )));
        }
        if NaiveTime::parse_from_str(&self.time, TIME_FORMAT).is_err() {
            return Err(AppointmentError::ValidationError(format!(
                "time '{}' must be formatted as HH:MM",
                self.time
            )));
        }
        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_PATTERN.is_match(email)
}

fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
        && phone.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
}

// ==============================================================================
// REMINDER MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doctor_id: String,
    pub contact: PatientContact,
    pub appointment_at: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
    /// Flips false -> true exactly once.
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Reminder {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.fire_at <= now
    }

    pub fn message(&self) -> String {
        format!(
            "Hi {}, this is a reminder of your appointment with doctor {} on {}.",
            self.contact.name,
            self.doctor_id,
            self.appointment_at.format("%Y-%m-%d at %H:%M UTC"),
        )
    }
}

/// Outcome of one pass of the dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub scanned_at: DateTime<Utc>,
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Reminders that disappeared (appointment cancelled) between the scan and their send.
    pub skipped: usize,
}

impl DispatchReport {
    pub fn new(scanned_at: DateTime<Utc>, due: usize) -> Self {
        Self {
            scanned_at,
            due,
            sent: 0,
            failed: 0,
            skipped: 0,
        }
    }

    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

pub(crate) fn parse_schedule(date: &str, time: &str) -> Result<DateTime<Utc>, ReminderError> {
    let date_part = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| ReminderError::InvalidSchedule(format!("date '{}': {}", date, e)))?;
    let time_part = NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map_err(|e| ReminderError::InvalidSchedule(format!("time '{}': {}", time, e)))?;
    Ok(NaiveDateTime::new(date_part, time_part).and_utc())
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ReminderError {
    #[error("Cannot derive reminder schedule from {0}")]
    InvalidSchedule(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Notification rejected with status {0}")]
    Rejected(u16),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match &err {
            AppointmentError::NotFound(_) | AppointmentError::DoctorNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: "1".to_string(),
            patient_name: "Jane Doe".to_string(),
            patient_email: "jane@example.com".to_string(),
            patient_phone: "+1 555 0100 200".to_string(),
            date: "2024-12-25".to_string(),
            time: "10:00".to_string(),
            reason: "Annual checkup".to_string(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_malformed_fields() {
        let mut bad_email = request();
        bad_email.patient_email = "jane.example.com".to_string();
        assert!(matches!(bad_email.validate(), Err(AppointmentError::ValidationError(_))));

        let mut bad_date = request();
        bad_date.date = "25/12/2024".to_string();
        assert!(matches!(bad_date.validate(), Err(AppointmentError::ValidationError(_))));

        let mut bad_time = request();
        bad_time.time = "10am".to_string();
        assert!(matches!(bad_time.validate(), Err(AppointmentError::ValidationError(_))));

        let mut no_name = request();
        no_name.patient_name = "  ".to_string();
        assert!(matches!(no_name.validate(), Err(AppointmentError::ValidationError(_))));
    }

    #[test]
    fn rejects_malformed_contact_details() {
        let mut spaced_email = request();
        spaced_email.patient_email = "jane doe@@exa mple.com".to_string();
        assert!(matches!(spaced_email.validate(), Err(AppointmentError::ValidationError(msg)) if msg.contains("patient_email")));

        let mut long_email = request();
        long_email.patient_email = format!("{}@example.com", "a".repeat(250));
        assert!(long_email.validate().is_err());

        let mut chatty_phone = request();
        chatty_phone.patient_phone = "call me 1234567 maybe".to_string();
        assert!(matches!(chatty_phone.validate(), Err(AppointmentError::ValidationError(msg)) if msg.contains("patient_phone")));

        let mut short_phone = request();
        short_phone.patient_phone = "12-34".to_string();
        assert!(short_phone.validate().is_err());
    }

    #[test]
    fn accepts_common_phone_formats() {
        for phone in ["+1 555 0100 200", "555-0100", "(555) 010-0200", "+44.20.7946.0958"] {
            let mut req = request();
            req.patient_phone = phone.to_string();
            assert!(req.validate().is_ok(), "{} should be accepted", phone);
        }
    }

    #[test]
    fn parses_schedule_as_utc() {
        let at = parse_schedule("2024-12-25", "10:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2024-12-25T10:00:00+00:00");
        assert!(parse_schedule("2024-13-01", "10:00").is_err());
    }

    #[test]
    fn maps_to_http_errors() {
        let err: AppError = AppointmentError::DoctorNotFound("42".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));
        let err: AppError = AppointmentError::ValidationError("bad".to_string()).into();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
