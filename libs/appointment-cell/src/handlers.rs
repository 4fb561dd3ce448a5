// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::router::AppointmentContext;

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

/// Books an appointment after boundary validation. The requested time must be
/// one of the doctor's slots; an unknown doctor is reported by the booking
/// service as not found.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentContext>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    request.validate()?;

    if let Some(doctor) = state.booking.catalog().get_doctor(&request.doctor_id).await {
        if !doctor.offers_slot(&request.time) {
            return Err(AppointmentError::ValidationError(format!(
                "{} has no {} slot; available: {}",
                doctor.name,
                request.time,
                doctor.available_slots.join(", ")
            ))
            .into());
        }
    }

    let (appointment, reminder) = state.booking.book(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "reminder_scheduled": reminder.is_some(),
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentContext>>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.list_appointments().await;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.get_appointment(appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// REMINDER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment_reminder(
    State(state): State<Arc<AppointmentContext>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let reminder = state
        .booking
        .reminder_for(appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No reminder scheduled for appointment {}", appointment_id)))?;

    Ok(Json(json!(reminder)))
}

#[axum::debug_handler]
pub async fn list_reminders(
    State(state): State<Arc<AppointmentContext>>,
) -> Result<Json<Value>, AppError> {
    let reminders = state.booking.list_reminders().await;
    let pending = reminders.iter().filter(|r| !r.sent).count();

    Ok(Json(json!({
        "reminders": reminders,
        "total": reminders.len(),
        "pending": pending
    })))
}

#[axum::debug_handler]
pub async fn dispatch_reminders(
    State(state): State<Arc<AppointmentContext>>,
) -> Result<Json<Value>, AppError> {
    let report = state.dispatcher.run_scan().await;
    Ok(Json(json!(report)))
}
