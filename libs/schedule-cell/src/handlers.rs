use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BlockPreview, BlockRequest, ConfigureScheduleRequest, PreviewQuery, ScheduleQuery};
use crate::services::{AvailabilityService, BlockingService, SlotStore};

#[derive(Clone)]
pub struct ScheduleState {
    pub config: Arc<AppConfig>,
    pub store: Arc<SlotStore>,
    pub availability: Arc<AvailabilityService>,
    pub blocking: Arc<BlockingService>,
}

fn require_owner(user: &User, doctor_id: Uuid) -> Result<(), AppError> {
    if user.is_self_or_admin(&doctor_id.to_string()) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the doctor or an admin can change this schedule".to_string()))
    }
}

pub async fn get_schedule(
    State(state): State<ScheduleState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state.availability.list_slots(doctor_id, query.from, query.to).await?;
    Ok(Json(json!({ "availability": slots })))
}

pub async fn configure_schedule(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<ConfigureScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, doctor_id)?;

    if let Some(body_doctor) = request.doctor_id {
        if body_doctor != doctor_id {
            return Err(AppError::ValidationError(
                "doctorId in the body does not match the path".to_string(),
            ));
        }
    }

    let window = request.into_window(doctor_id, i64::from(state.config.default_slot_minutes));
    let result = state.availability.configure_schedule(&window).await?;

    Ok(Json(json!({
        "message": "Schedule configured",
        "result": result
    })))
}

pub async fn block_schedule(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<BlockRequest>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, doctor_id)?;
    info!("User {} blocking schedule of doctor {} (force={})", user.id, doctor_id, request.force);

    let result = state.blocking.block_range(doctor_id, &request).await?;

    Ok(Json(json!({
        "message": "Schedule blocked",
        "result": result
    })))
}

pub async fn preview_block(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Value>, AppError> {
    require_owner(&user, doctor_id)?;

    let appointments = state.blocking.preview_block(doctor_id, query.date).await?;
    Ok(Json(json!(BlockPreview { date: query.date, appointments })))
}

pub async fn book_slot(
    State(state): State<ScheduleState>,
    Extension(user): Extension<User>,
    Path((doctor_id, slot_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    if !user.has_role("patient") && !user.is_self_or_admin(&doctor_id.to_string()) {
        return Err(AppError::Forbidden(
            "Only patients, the doctor or an admin can book this slot".to_string(),
        ));
    }
    info!("User {} booking slot {} of doctor {}", user.id, slot_id, doctor_id);

    let slot = state.store.book_slot(doctor_id, slot_id).await?;
    Ok(Json(json!(slot)))
}
