// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, AppointmentState};
use crate::services::{AppointmentLedger, AppointmentLifecycleService};

pub fn appointment_routes(config: Arc<AppConfig>, ledger: Arc<dyn AppointmentLedger>) -> Router {
    let state = AppointmentState {
        lifecycle: Arc::new(AppointmentLifecycleService::new(ledger)),
    };

    Router::new()
        // Listings
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_appointments))
        .route("/patient/{patient_id}", get(handlers::get_patient_appointments))

        // Lifecycle actions
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", delete(handlers::cancel_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/{appointment_id}/start", post(handlers::start_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/mark-no-show", post(handlers::mark_no_show))

        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
