// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentAction, AppointmentListResponse};
use crate::services::lifecycle::AppointmentLifecycleService;

#[derive(Clone)]
pub struct AppointmentState {
    pub lifecycle: Arc<AppointmentLifecycleService>,
}

fn is_participant(user: &User, appointment: &Appointment) -> bool {
    user.is_self_or_admin(&appointment.doctor_id.to_string())
        || user.id.eq_ignore_ascii_case(&appointment.patient_id.to_string())
}

/// Doctor-side actions are reserved for the appointment's doctor; patients may only cancel.
fn may_apply(user: &User, appointment: &Appointment, action: AppointmentAction) -> bool {
    if user.is_self_or_admin(&appointment.doctor_id.to_string()) {
        return true;
    }
    action == AppointmentAction::Cancel
        && user.id.eq_ignore_ascii_case(&appointment.patient_id.to_string())
}

async fn run_action(
    state: &AppointmentState,
    user: &User,
    appointment_id: Uuid,
    action: AppointmentAction,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.get_appointment(appointment_id).await?;

    if !may_apply(user, &appointment, action) {
        return Err(AppError::Forbidden(format!(
            "Not authorized to {} this appointment",
            action
        )));
    }

    info!("User {} requested {} on appointment {}", user.id, action, appointment_id);
    let updated = state.lifecycle.apply(appointment_id, action).await?;

    Ok(Json(json!(updated)))
}

// ==============================================================================
// LIFECYCLE ACTION HANDLERS
// ==============================================================================

pub async fn confirm_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    run_action(&state, &user, appointment_id, AppointmentAction::Confirm).await
}

pub async fn start_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    run_action(&state, &user, appointment_id, AppointmentAction::Start).await
}

pub async fn complete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    run_action(&state, &user, appointment_id, AppointmentAction::Complete).await
}

pub async fn mark_no_show(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    run_action(&state, &user, appointment_id, AppointmentAction::MarkNoShow).await
}

pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    run_action(&state, &user, appointment_id, AppointmentAction::Cancel).await
}

// ==============================================================================
// READ HANDLERS
// ==============================================================================

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.get_appointment(appointment_id).await?;

    if !is_participant(&user, &appointment) {
        return Err(AppError::Forbidden("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(json!(appointment)))
}

pub async fn get_doctor_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self_or_admin(&doctor_id.to_string()) {
        return Err(AppError::Forbidden("Not authorized to view this doctor's appointments".to_string()));
    }

    let appointments = state.lifecycle.doctor_appointments(doctor_id).await?;
    Ok(Json(json!(AppointmentListResponse { appointments })))
}

pub async fn get_patient_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self_or_admin(&patient_id.to_string()) && !user.is_doctor() {
        return Err(AppError::Forbidden("Not authorized to view this patient's appointments".to_string()));
    }

    let appointments = state.lifecycle.patient_appointments(patient_id).await?;
    Ok(Json(json!(AppointmentListResponse { appointments })))
}
