use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{AppointmentAction, AppointmentStatus};

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Cannot {action} an appointment that is {from}")]
    InvalidTransition {
        action: AppointmentAction,
        from: AppointmentStatus,
    },

    #[error("Appointment {id} changed status concurrently (expected {expected})")]
    StaleStatus {
        id: Uuid,
        expected: AppointmentStatus,
    },

    #[error("Appointment ledger error: {0}")]
    Ledger(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidTransition { .. } => AppError::InvalidTransition(err.to_string()),
            AppointmentError::StaleStatus { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::Ledger(msg) => AppError::Database(msg),
        }
    }
}
