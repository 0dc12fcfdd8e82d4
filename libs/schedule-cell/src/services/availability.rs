use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::models::{AvailabilityWindow, ConfigureResult, Slot, SlotStatus};
use crate::services::calendar;
use crate::services::store::{DoctorSlots, SlotStore};

pub const MAX_RANGE_DAYS: i64 = 366;
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

/// Mutations computed for one day before anything is written.
#[derive(Debug, Default)]
pub struct DayPlan {
    pub removals: Vec<DateTime<Utc>>,
    pub inserts: Vec<Slot>,
    pub result: ConfigureResult,
}

pub struct AvailabilityService {
    store: Arc<SlotStore>,
    timezone: Tz,
}

impl AvailabilityService {
    pub fn new(store: Arc<SlotStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Generates slots for every day of the window.
    ///
    /// Each day is applied all-or-nothing. A failing day stops the run and
    /// leaves earlier days written.
    pub async fn configure_schedule(&self, window: &AvailabilityWindow) -> Result<ConfigureResult, ScheduleError> {
        validate_window(window)?;
        let start_hour = calendar::parse_hour("startHour", &window.start_hour)?;
        let end_hour = calendar::parse_hour("endHour", &window.end_hour)?;
        let step = Duration::minutes(window.slot_minutes);

        info!(
            "Configuring schedule for doctor {} from {} to {} ({}-{}, {} min, overwrite={})",
            window.doctor_id,
            window.from,
            window.to,
            window.start_hour,
            window.end_hour,
            window.slot_minutes,
            window.overwrite
        );

        let mut slots = self.store.lock(window.doctor_id).await;
        let mut total = ConfigureResult::default();

        for day in window.from.iter_days().take_while(|day| *day <= window.to) {
            let day_start = calendar::local_instant(self.timezone, day, start_hour);
            let day_end = calendar::local_instant(self.timezone, day, end_hour);
            if day_start >= day_end {
                warn!("Window {}-{} collapses on {} in {}, skipping day", start_hour, end_hour, day, self.timezone);
                continue;
            }

            let day_candidates = candidates(day_start, day_end, step);
            let plan = if window.overwrite {
                plan_overwrite(&slots, window.doctor_id, day_start, day_end, &day_candidates)
            } else {
                plan_gap_fill(&slots, window.doctor_id, &day_candidates)
            };

            debug!(
                "Day {}: removing {}, inserting {}, {} updated",
                day,
                plan.removals.len(),
                plan.inserts.len(),
                plan.result.updated
            );

            slots.apply(&plan.removals, plan.inserts).map_err(|e| {
                warn!("Schedule configuration for doctor {} stopped at {}: {}", window.doctor_id, day, e);
                e
            })?;
            total += plan.result;
        }

        info!(
            "Schedule configured for doctor {}: {} created, {} updated",
            window.doctor_id, total.created, total.updated
        );
        Ok(total)
    }

    /// Slots starting on a local day in `[from, to]`, ordered by start.
    pub async fn list_slots(&self, doctor_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Slot>, ScheduleError> {
        if from > to {
            return Err(ScheduleError::Validation("from must not be after to".to_string()));
        }
        let start = calendar::day_start(self.timezone, from);
        let (_, end) = calendar::day_bounds(self.timezone, to);

        Ok(self.store.list(doctor_id, start, end).await)
    }
}

pub fn validate_window(window: &AvailabilityWindow) -> Result<(), ScheduleError> {
    if window.slot_minutes <= 0 {
        return Err(ScheduleError::Validation("slotMinutes must be greater than zero".to_string()));
    }
    if window.slot_minutes > MAX_SLOT_MINUTES {
        return Err(ScheduleError::Validation(format!(
            "slotMinutes must be at most {}",
            MAX_SLOT_MINUTES
        )));
    }
    if window.from > window.to {
        return Err(ScheduleError::Validation("from must not be after to".to_string()));
    }
    if (window.to - window.from).num_days() >= MAX_RANGE_DAYS {
        return Err(ScheduleError::Validation(format!(
            "A schedule can span at most {} calendar days",
            MAX_RANGE_DAYS
        )));
    }

    let start = calendar::parse_hour("startHour", &window.start_hour)?;
    let end = calendar::parse_hour("endHour", &window.end_hour)?;
    if start >= end {
        return Err(ScheduleError::Validation("startHour must be before endHour".to_string()));
    }
    Ok(())
}

/// `[start + k*step, start + (k+1)*step)` while the end stays within the window.
pub fn candidates(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut out = Vec::new();
    let mut current = start;
    while let Some(next) = current.checked_add_signed(step).filter(|next| *next <= end) {
        out.push((current, next));
        current = next;
    }
    out
}

/// Regenerates the day: non-BOOKED slots in the window go, BOOKED ones stay.
pub fn plan_overwrite(
    slots: &DoctorSlots,
    doctor_id: Uuid,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    candidates: &[(DateTime<Utc>, DateTime<Utc>)],
) -> DayPlan {
    let mut plan = DayPlan::default();
    let mut kept: Vec<&Slot> = Vec::new();

    for existing in slots.overlapping(window_start, window_end) {
        if existing.status == SlotStatus::Booked {
            kept.push(existing);
        } else {
            plan.removals.push(existing.start);
        }
    }

    for &(start, end) in candidates {
        if kept.iter().any(|booked| booked.overlaps(start, end)) {
            continue;
        }
        plan.inserts.push(Slot::available(doctor_id, start, end));
        plan.result.created += 1;
    }
    plan
}

/// Fills gaps only; existing slots are never touched.
pub fn plan_gap_fill(
    slots: &DoctorSlots,
    doctor_id: Uuid,
    candidates: &[(DateTime<Utc>, DateTime<Utc>)],
) -> DayPlan {
    let mut plan = DayPlan::default();

    for &(start, end) in candidates {
        if let Some(existing) = slots.at(start).filter(|slot| slot.end == end) {
            if existing.differs_from_fresh() {
                plan.result.updated += 1;
            }
            continue;
        }
        if !slots.overlapping(start, end).is_empty() {
            continue;
        }
        plan.inserts.push(Slot::available(doctor_id, start, end));
        plan.result.created += 1;
    }
    plan
}
