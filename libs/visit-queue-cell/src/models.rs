use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Waiting,
    Called,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Cancelled)
    }

    /// WAITING or CALLED: the patient still holds a place.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, target: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (*self, target),
            (Waiting, Called) | (Called, Completed) | (Waiting, Cancelled) | (Called, Cancelled)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TicketStatus::Waiting => "WAITING",
            TicketStatus::Called => "CALLED",
            TicketStatus::Completed => "COMPLETED",
            TicketStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// One patient's place in a doctor's walk-in queue. Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTicket {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QueueTicket {
    pub fn new(doctor_id: Uuid, patient_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            status: TicketStatus::Waiting,
            created_at,
            called_at: None,
            completed_at: None,
        }
    }

    /// FIFO key among WAITING tickets.
    pub fn queue_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorQueueRequest {
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub ticket: QueueTicket,
    pub position: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub ticket: QueueTicket,
    pub position: Option<usize>,
    pub estimated_wait_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub waiting: usize,
    pub max_count: usize,
    pub available_slots: usize,
    pub is_full: bool,
}

impl QueueStats {
    pub fn new(waiting: usize, max_count: usize) -> Self {
        Self {
            waiting,
            max_count,
            available_slots: max_count.saturating_sub(waiting),
            is_full: waiting >= max_count,
        }
    }
}
