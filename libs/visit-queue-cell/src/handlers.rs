use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::{auth::User, error::AppError};

use crate::{models::QueueTicket, services::QueueCoordinator, DoctorQueueRequest};

#[derive(Clone)]
pub struct QueueState {
    pub coordinator: Arc<QueueCoordinator>,
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))
}

fn require_doctor(user: &User, doctor_id: Uuid) -> Result<(), AppError> {
    if user.is_self_or_admin(&doctor_id.to_string()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the doctor or an admin can manage this queue".to_string()))
    }
}

fn may_view_ticket(user: &User, ticket: &QueueTicket) -> bool {
    user.is_self_or_admin(&ticket.doctor_id.to_string())
        || user.id.eq_ignore_ascii_case(&ticket.patient_id.to_string())
}

/// Join a doctor's queue as the calling patient
pub async fn join_queue(
    State(state): State<QueueState>,
    Extension(user): Extension<User>,
    Json(request): Json<DoctorQueueRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;
    info!("Queue join request from patient {} for doctor {}", patient_id, request.doctor_id);

    let joined = state.coordinator.join(request.doctor_id, patient_id).await?;
    Ok(Json(json!(joined)))
}

/// Call the next waiting patient
pub async fn call_next(
    State(state): State<QueueState>,
    Extension(user): Extension<User>,
    Json(request): Json<DoctorQueueRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user, request.doctor_id)?;

    let called = state.coordinator.call_next(request.doctor_id).await?;
    Ok(Json(json!(called)))
}

pub async fn get_current(
    State(state): State<QueueState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!(state.coordinator.current(doctor_id).await)))
}

pub async fn get_waiting(
    State(state): State<QueueState>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user, doctor_id)?;
    Ok(Json(json!(state.coordinator.waiting(doctor_id).await)))
}

pub async fn get_queue_stats(
    State(state): State<QueueState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!(state.coordinator.stats(doctor_id).await)))
}

pub async fn get_position(
    State(state): State<QueueState>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let position = state.coordinator.get_position(ticket_id).await?;

    if !may_view_ticket(&user, &position.ticket) {
        return Err(AppError::Forbidden("Not authorized to view this ticket".to_string()));
    }

    Ok(Json(json!(position)))
}

pub async fn complete_ticket(
    State(state): State<QueueState>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ticket = state.coordinator.ticket(ticket_id).await?;
    require_doctor(&user, ticket.doctor_id)?;

    let completed = state.coordinator.complete(ticket_id).await?;
    Ok(Json(json!(completed)))
}

pub async fn cancel_ticket(
    State(state): State<QueueState>,
    Extension(user): Extension<User>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ticket = state.coordinator.ticket(ticket_id).await?;
    if !may_view_ticket(&user, &ticket) {
        return Err(AppError::Forbidden("Not authorized to cancel this ticket".to_string()));
    }

    info!("User {} cancelling ticket {}", user.id, ticket_id);
    let cancelled = state.coordinator.cancel(ticket_id).await?;
    Ok(Json(json!(cancelled)))
}
