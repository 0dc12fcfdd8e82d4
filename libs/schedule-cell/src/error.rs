use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::{models::Appointment, AppointmentError};
use shared_models::error::AppError;

use crate::models::SlotStatus;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{} live appointment(s) fall inside the requested block", .conflicts.len())]
    Conflict { conflicts: Vec<Appointment> },

    #[error("Slot not found: {0}")]
    SlotNotFound(Uuid),

    #[error("Slot {slot_id} is {status} and cannot be booked")]
    SlotUnavailable { slot_id: Uuid, status: SlotStatus },

    #[error("Slot starting at {0} would overlap an existing slot")]
    Overlap(DateTime<Utc>),

    #[error(transparent)]
    Ledger(#[from] AppointmentError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AppError::ValidationError(msg),
            ScheduleError::Conflict { ref conflicts } => AppError::ScheduleConflict {
                message: err.to_string(),
                conflicts: json!(conflicts),
            },
            ScheduleError::SlotNotFound(_) => AppError::NotFound(err.to_string()),
            ScheduleError::SlotUnavailable { .. } => AppError::Conflict(err.to_string()),
            ScheduleError::Overlap(_) => AppError::Internal(err.to_string()),
            ScheduleError::Ledger(inner) => inner.into(),
        }
    }
}
