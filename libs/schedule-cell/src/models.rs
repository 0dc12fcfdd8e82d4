use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Blocked,
    Booked,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "AVAILABLE"),
            SlotStatus::Blocked => write!(f, "BLOCKED"),
            SlotStatus::Booked => write!(f, "BOOKED"),
        }
    }
}

/// A fixed-duration bookable unit on one doctor's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

impl Slot {
    pub fn available(doctor_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            start,
            end,
            status: SlotStatus::Available,
            block_reason: None,
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Whether regenerating this exact slot would change anything.
    pub fn differs_from_fresh(&self) -> bool {
        self.status != SlotStatus::Available || self.block_reason.is_some()
    }
}

// ==============================================================================
// AVAILABILITY CONFIGURATION
// ==============================================================================

/// Validated-on-use input of the configurator. Hours are local `HH:mm`.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityWindow {
    pub doctor_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub start_hour: String,
    pub end_hour: String,
    pub slot_minutes: i64,
    pub overwrite: bool,
}

/// Request body of `POST /schedule/{doctorId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureScheduleRequest {
    #[serde(default)]
    pub doctor_id: Option<Uuid>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub start_hour: String,
    pub end_hour: String,
    #[serde(default)]
    pub slot_minutes: Option<i64>,
    #[serde(default)]
    pub overwrite: Option<bool>,
}

impl ConfigureScheduleRequest {
    pub fn into_window(self, doctor_id: Uuid, default_slot_minutes: i64) -> AvailabilityWindow {
        AvailabilityWindow {
            doctor_id,
            from: self.from,
            to: self.to,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            slot_minutes: self.slot_minutes.unwrap_or(default_slot_minutes),
            overwrite: self.overwrite.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureResult {
    pub created: usize,
    pub updated: usize,
}

impl std::ops::AddAssign for ConfigureResult {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// ==============================================================================
// BLOCKING
// ==============================================================================

/// A block boundary: an exact instant or a whole local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockBoundary {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub start: BlockBoundary,
    pub end: BlockBoundary,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResult {
    pub blocked_from: DateTime<Utc>,
    pub blocked_to: DateTime<Utc>,
    pub blocked_slots: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockPreview {
    pub date: NaiveDate,
    pub appointments: Vec<Appointment>,
}
