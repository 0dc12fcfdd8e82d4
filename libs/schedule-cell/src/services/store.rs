use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::models::{Slot, SlotStatus};

/// One doctor's slots, keyed by start. Slots never overlap.
#[derive(Debug, Default)]
pub struct DoctorSlots {
    by_start: BTreeMap<DateTime<Utc>, Slot>,
}

impl DoctorSlots {
    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    pub fn at(&self, start: DateTime<Utc>) -> Option<&Slot> {
        self.by_start.get(&start)
    }

    /// Slots with `slot.start < end && slot.end > start`, in start order.
    pub fn overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Slot> {
        let mut hits: Vec<&Slot> = self
            .by_start
            .range(..end)
            .rev()
            .take_while(|(_, slot)| slot.end > start)
            .map(|(_, slot)| slot)
            .collect();
        hits.reverse();
        hits
    }

    pub fn starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Slot> {
        self.by_start.range(from..to).map(|(_, slot)| slot.clone()).collect()
    }

    /// Removes `removals` then inserts `inserts`, or changes nothing when an
    /// insert would overlap.
    pub fn apply(&mut self, removals: &[DateTime<Utc>], inserts: Vec<Slot>) -> Result<(), ScheduleError> {
        let removed: Vec<&DateTime<Utc>> = removals.iter().collect();
        let mut pending: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(inserts.len());

        for slot in &inserts {
            if slot.start >= slot.end {
                return Err(ScheduleError::Validation(format!(
                    "Slot starting at {} does not end after it starts",
                    slot.start
                )));
            }
            let clashes_existing = self
                .overlapping(slot.start, slot.end)
                .iter()
                .any(|existing| !removed.contains(&&existing.start));
            let clashes_pending = pending
                .iter()
                .any(|(start, end)| *start < slot.end && *end > slot.start);
            if clashes_existing || clashes_pending {
                return Err(ScheduleError::Overlap(slot.start));
            }
            pending.push((slot.start, slot.end));
        }

        for start in removals {
            self.by_start.remove(start);
        }
        for slot in inserts {
            self.by_start.insert(slot.start, slot);
        }
        Ok(())
    }

    /// Marks every slot overlapping the window BLOCKED. Returns how many were written.
    pub fn block(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, reason: Option<&str>) -> usize {
        let keys: Vec<DateTime<Utc>> = self.overlapping(start, end).iter().map(|slot| slot.start).collect();

        for key in &keys {
            if let Some(slot) = self.by_start.get_mut(key) {
                slot.status = SlotStatus::Blocked;
                slot.block_reason = reason.map(str::to_string);
            }
        }
        keys.len()
    }

    pub fn book(&mut self, slot_id: Uuid) -> Result<Slot, ScheduleError> {
        let slot = self
            .by_start
            .values_mut()
            .find(|slot| slot.id == slot_id)
            .ok_or(ScheduleError::SlotNotFound(slot_id))?;

        if slot.status != SlotStatus::Available {
            return Err(ScheduleError::SlotUnavailable {
                slot_id,
                status: slot.status,
            });
        }

        slot.status = SlotStatus::Booked;
        Ok(slot.clone())
    }
}

/// Keyed per-doctor slot store. The outer map lock is only held to find the
/// doctor's entry.
#[derive(Default)]
pub struct SlotStore {
    doctors: RwLock<HashMap<Uuid, Arc<Mutex<DoctorSlots>>>>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes every mutation of one doctor's calendar.
    pub async fn lock(&self, doctor_id: Uuid) -> OwnedMutexGuard<DoctorSlots> {
        let existing = self.doctors.read().await.get(&doctor_id).cloned();
        let entry = match existing {
            Some(entry) => entry,
            None => self.doctors.write().await.entry(doctor_id).or_default().clone(),
        };
        entry.lock_owned().await
    }

    pub async fn list(&self, doctor_id: Uuid, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Slot> {
        let slots = self.lock(doctor_id).await;
        let found = slots.starting_between(from, to);
        debug!("Found {} slots for doctor {} between {} and {}", found.len(), doctor_id, from, to);
        found
    }

    /// External booking trigger: AVAILABLE becomes BOOKED.
    pub async fn book_slot(&self, doctor_id: Uuid, slot_id: Uuid) -> Result<Slot, ScheduleError> {
        let booked = self.lock(doctor_id).await.book(slot_id)?;
        info!("Booked slot {} for doctor {} at {}", slot_id, doctor_id, booked.start);
        Ok(booked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn slot(hour: u32, minute: u32) -> Slot {
        let start = at(hour, minute);
        Slot::available(Uuid::nil(), start, start + Duration::minutes(30))
    }

    #[test]
    fn overlapping_finds_straddling_slot() {
        let mut slots = DoctorSlots::default();
        slots.apply(&[], vec![slot(8, 0), slot(8, 30), slot(9, 0)]).unwrap();

        let hits = slots.overlapping(at(8, 45), at(9, 10));
        let starts: Vec<_> = hits.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at(8, 30), at(9, 0)]);

        assert!(slots.overlapping(at(9, 30), at(10, 0)).is_empty());
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut slots = DoctorSlots::default();
        slots.apply(&[], vec![slot(8, 0)]).unwrap();

        let result = slots.apply(&[], vec![slot(9, 0), slot(8, 15)]);
        assert_matches!(result, Err(ScheduleError::Overlap(_)));
        assert_eq!(slots.len(), 1);
        assert!(slots.at(at(9, 0)).is_none());
    }

    #[test]
    fn apply_replaces_removed_slots() {
        let mut slots = DoctorSlots::default();
        slots.apply(&[], vec![slot(8, 0)]).unwrap();

        slots.apply(&[at(8, 0)], vec![slot(8, 0), slot(8, 30)]).unwrap();
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn block_marks_every_overlap() {
        let mut slots = DoctorSlots::default();
        slots.apply(&[], vec![slot(8, 0), slot(8, 30), slot(9, 0)]).unwrap();

        let blocked = slots.block(at(8, 10), at(8, 40), Some("Congreso"));
        assert_eq!(blocked, 2);
        assert_eq!(slots.at(at(8, 0)).unwrap().status, SlotStatus::Blocked);
        assert_eq!(slots.at(at(8, 30)).unwrap().block_reason.as_deref(), Some("Congreso"));
        assert_eq!(slots.at(at(9, 0)).unwrap().status, SlotStatus::Available);
    }

    #[test]
    fn booking_rules() {
        let mut slots = DoctorSlots::default();
        let open = slot(8, 0);
        let open_id = open.id;
        slots.apply(&[], vec![open]).unwrap();

        assert_eq!(slots.book(open_id).unwrap().status, SlotStatus::Booked);
        assert_matches!(
            slots.book(open_id),
            Err(ScheduleError::SlotUnavailable { status: SlotStatus::Booked, .. })
        );
        assert_matches!(slots.book(Uuid::new_v4()), Err(ScheduleError::SlotNotFound(_)));
    }

    #[tokio::test]
    async fn store_keeps_doctors_apart() {
        let store = SlotStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        store.lock(a).await.apply(&[], vec![slot(8, 0)]).unwrap();

        assert_eq!(store.list(a, at(0, 0), at(23, 0)).await.len(), 1);
        assert!(store.list(b, at(0, 0), at(23, 0)).await.is_empty());
    }
}
