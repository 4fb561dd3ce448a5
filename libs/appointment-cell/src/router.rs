// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::services::{BookingService, ReminderDispatcher};

/// Shared state behind every appointment route.
pub struct AppointmentContext {
    pub booking: Arc<BookingService>,
    pub dispatcher: Arc<ReminderDispatcher>,
}

impl AppointmentContext {
    pub fn new(booking: Arc<BookingService>, dispatcher: Arc<ReminderDispatcher>) -> Self {
        Self { booking, dispatcher }
    }
}

pub fn appointment_routes(state: Arc<AppointmentContext>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/reminders", get(handlers::list_reminders))
        .route("/reminders/dispatch", post(handlers::dispatch_reminders)) // Manual scan, same guarantees as the loop
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).delete(handlers::cancel_appointment),
        )
        .route("/{appointment_id}/reminder", get(handlers::get_appointment_reminder))
        .with_state(state)
}
