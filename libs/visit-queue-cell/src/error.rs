use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::TicketStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue for doctor {doctor_id} is full ({max} waiting)")]
    QueueFull { doctor_id: Uuid, max: usize },

    #[error("Patient already holds ticket {ticket_id} in this queue")]
    DuplicateTicket { ticket_id: Uuid },

    #[error("Ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("Invalid ticket status transition from {from} to {to}")]
    InvalidStatusTransition { from: TicketStatus, to: TicketStatus },
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::QueueFull { .. } => AppError::QueueFull(err.to_string()),
            QueueError::DuplicateTicket { .. } => AppError::DuplicateTicket(err.to_string()),
            QueueError::TicketNotFound(_) => AppError::NotFound(err.to_string()),
            QueueError::InvalidStatusTransition { .. } => AppError::InvalidTransition(err.to_string()),
        }
    }
}
