use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::Appointment;
use appointment_cell::services::AppointmentLedger;

use crate::error::ScheduleError;
use crate::models::{BlockBoundary, BlockRequest, BlockResult};
use crate::services::calendar;
use crate::services::store::SlotStore;

/// Blocks slots after checking the ledger for live appointments.
pub struct BlockingService {
    store: Arc<SlotStore>,
    ledger: Arc<dyn AppointmentLedger>,
    timezone: Tz,
}

impl BlockingService {
    pub fn new(store: Arc<SlotStore>, ledger: Arc<dyn AppointmentLedger>, timezone: Tz) -> Self {
        Self { store, ledger, timezone }
    }

    /// Every appointment on the local day, whatever its status. Read-only.
    pub async fn preview_block(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, ScheduleError> {
        let (start, next_day) = calendar::day_bounds(self.timezone, date);

        let appointments: Vec<Appointment> = self
            .ledger
            .list_for_doctor_between(doctor_id, start, next_day)
            .await?
            .into_iter()
            .filter(|appointment| appointment.date < next_day)
            .collect();

        debug!("Preview for doctor {} on {}: {} appointments", doctor_id, date, appointments.len());
        Ok(appointments)
    }

    /// Blocks `[start, end]` for the doctor. A whole-day end stops before the
    /// next day's midnight.
    ///
    /// Without `force`, any scheduled, confirmed or in-progress appointment in
    /// the window aborts the call with the list of conflicts. With `force`,
    /// every overlapping slot is blocked, BOOKED ones included, and the
    /// appointments themselves are left alone.
    pub async fn block_range(&self, doctor_id: Uuid, request: &BlockRequest) -> Result<BlockResult, ScheduleError> {
        let (start, end, day_end) = self.resolve(request.start, request.end);
        if start >= end {
            return Err(ScheduleError::Validation("Block start must be before its end".to_string()));
        }
        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty());

        let mut slots = self.store.lock(doctor_id).await;

        let conflicts: Vec<Appointment> = self
            .ledger
            .list_for_doctor_between(doctor_id, start, end)
            .await?
            .into_iter()
            .filter(|appointment| appointment.blocks_schedule())
            .filter(|appointment| !day_end || appointment.date < end)
            .collect();

        if !conflicts.is_empty() {
            if !request.force {
                info!(
                    "Block for doctor {} ({} - {}) refused: {} conflicting appointments",
                    doctor_id,
                    start,
                    end,
                    conflicts.len()
                );
                return Err(ScheduleError::Conflict { conflicts });
            }
            warn!(
                "Forcing block for doctor {} over {} live appointments",
                doctor_id,
                conflicts.len()
            );
        }

        let blocked_slots = slots.block(start, end, reason);
        info!("Blocked {} slots for doctor {} from {} to {}", blocked_slots, doctor_id, start, end);

        Ok(BlockResult {
            blocked_from: start,
            blocked_to: end,
            blocked_slots,
        })
    }

    /// Blocks one whole local day.
    pub async fn block_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        reason: Option<String>,
        force: bool,
    ) -> Result<BlockResult, ScheduleError> {
        let request = BlockRequest {
            start: BlockBoundary::Day(date),
            end: BlockBoundary::Day(date),
            reason,
            force,
        };
        self.block_range(doctor_id, &request).await
    }

    /// A day `start` is the start of that day; a day `end` is the start of the
    /// next one and is flagged as exclusive.
    fn resolve(&self, start: BlockBoundary, end: BlockBoundary) -> (DateTime<Utc>, DateTime<Utc>, bool) {
        let start = match start {
            BlockBoundary::Instant(instant) => instant,
            BlockBoundary::Day(date) => calendar::day_start(self.timezone, date),
        };
        let (end, day_end) = match end {
            BlockBoundary::Instant(instant) => (instant, false),
            BlockBoundary::Day(date) => (calendar::day_bounds(self.timezone, date).1, true),
        };
        (start, end, day_end)
    }
}
