use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use appointment_cell::{Appointment, AppointmentLedger, AppointmentStatus, InMemoryAppointmentLedger};
use schedule_cell::*;

struct Clinic {
    store: Arc<SlotStore>,
    ledger: Arc<InMemoryAppointmentLedger>,
    availability: AvailabilityService,
    blocking: BlockingService,
    doctor_id: Uuid,
}

fn clinic() -> Clinic {
    let store = Arc::new(SlotStore::new());
    let ledger = Arc::new(InMemoryAppointmentLedger::new());
    Clinic {
        availability: AvailabilityService::new(store.clone(), Tz::UTC),
        blocking: BlockingService::new(store.clone(), ledger.clone(), Tz::UTC),
        store,
        ledger,
        doctor_id: Uuid::new_v4(),
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn at(d: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, hour, minute, 0).unwrap()
}

fn morning(doctor_id: Uuid, from: u32, to: u32, overwrite: bool) -> AvailabilityWindow {
    AvailabilityWindow {
        doctor_id,
        from: day(from),
        to: day(to),
        start_hour: "08:00".to_string(),
        end_hour: "13:00".to_string(),
        slot_minutes: 30,
        overwrite,
    }
}

async fn appointment(clinic: &Clinic, date: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
    let appointment = Appointment {
        id: Uuid::new_v4(),
        doctor_id: clinic.doctor_id,
        patient_id: Uuid::new_v4(),
        date,
        status,
        reason: None,
    };
    clinic.ledger.insert(appointment.clone()).await;
    appointment
}

async fn all_slots(clinic: &Clinic) -> Vec<Slot> {
    clinic.availability.list_slots(clinic.doctor_id, day(1), day(31)).await.unwrap()
}

#[tokio::test]
async fn test_single_morning_creates_ten_slots() {
    let clinic = clinic();

    let result = clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();

    assert_eq!(result, ConfigureResult { created: 10, updated: 0 });

    let slots = all_slots(&clinic).await;
    assert_eq!(slots.len(), 10);
    assert_eq!(slots[0].start, at(10, 8, 0));
    assert_eq!(slots[9].end, at(10, 13, 0));
    for slot in &slots {
        assert_eq!(slot.status, SlotStatus::Available);
        assert_eq!(slot.end - slot.start, Duration::minutes(30));
        assert_eq!(slot.doctor_id, clinic.doctor_id);
    }
    for pair in slots.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
}

#[tokio::test]
async fn test_multi_day_range() {
    let clinic = clinic();

    let result = clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 14, true))
        .await
        .unwrap();

    assert_eq!(result.created, 50);
    let tuesday = clinic.availability.list_slots(clinic.doctor_id, day(11), day(11)).await.unwrap();
    assert_eq!(tuesday.len(), 10);
}

#[tokio::test]
async fn test_overwrite_preserves_booked_slot() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();

    let target = all_slots(&clinic).await[2].clone();
    let booked = clinic.store.book_slot(clinic.doctor_id, target.id).await.unwrap();

    let result = clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();
    assert_eq!(result, ConfigureResult { created: 9, updated: 0 });

    let slots = all_slots(&clinic).await;
    assert_eq!(slots.len(), 10);
    let kept = slots.iter().find(|slot| slot.id == booked.id).unwrap();
    assert_eq!(kept, &booked);
}

#[tokio::test]
async fn test_overwrite_replaces_different_slot_length() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();

    let mut hourly = morning(clinic.doctor_id, 10, 10, true);
    hourly.slot_minutes = 60;
    let result = clinic.availability.configure_schedule(&hourly).await.unwrap();

    assert_eq!(result.created, 5);
    assert_eq!(all_slots(&clinic).await.len(), 5);
}

#[tokio::test]
async fn test_gap_fill_never_changes_existing_slots() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();
    clinic
        .blocking
        .block_range(
            clinic.doctor_id,
            &BlockRequest {
                start: BlockBoundary::Instant(at(10, 8, 0)),
                end: BlockBoundary::Instant(at(10, 9, 0)),
                reason: Some("Reunión".to_string()),
                force: false,
            },
        )
        .await
        .unwrap();
    let before = all_slots(&clinic).await;

    let mut extended = morning(clinic.doctor_id, 10, 10, false);
    extended.end_hour = "14:00".to_string();
    let result = clinic.availability.configure_schedule(&extended).await.unwrap();

    assert_eq!(result, ConfigureResult { created: 2, updated: 2 });
    let after = all_slots(&clinic).await;
    assert_eq!(after.len(), 12);
    for slot in &before {
        assert!(after.contains(slot));
    }
}

#[tokio::test]
async fn test_invalid_window_mutates_nothing() {
    let clinic = clinic();

    let mut bad = morning(clinic.doctor_id, 10, 10, true);
    bad.slot_minutes = -15;
    assert_matches!(
        clinic.availability.configure_schedule(&bad).await,
        Err(ScheduleError::Validation(_))
    );

    let mut inverted = morning(clinic.doctor_id, 10, 10, true);
    inverted.start_hour = "13:00".to_string();
    inverted.end_hour = "08:00".to_string();
    assert_matches!(
        clinic.availability.configure_schedule(&inverted).await,
        Err(ScheduleError::Validation(_))
    );

    assert!(all_slots(&clinic).await.is_empty());
}

#[tokio::test]
async fn test_block_conflict_lists_only_live_appointments() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();
    let confirmed = appointment(&clinic, at(10, 9, 0), AppointmentStatus::Confirmed).await;
    appointment(&clinic, at(10, 10, 0), AppointmentStatus::Cancelled).await;
    appointment(&clinic, at(11, 9, 0), AppointmentStatus::Confirmed).await;
    let before = all_slots(&clinic).await;

    let result = clinic.blocking.block_date(clinic.doctor_id, day(10), None, false).await;

    let conflicts = match result {
        Err(ScheduleError::Conflict { conflicts }) => conflicts,
        other => panic!("expected a schedule conflict, got {:?}", other),
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, confirmed.id);
    assert_eq!(all_slots(&clinic).await, before);
}

#[tokio::test]
async fn test_block_date_ignores_next_midnight() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 11, true))
        .await
        .unwrap();
    let confirmed = appointment(&clinic, at(10, 9, 0), AppointmentStatus::Confirmed).await;
    appointment(&clinic, at(11, 0, 0), AppointmentStatus::Confirmed).await;

    let preview = clinic.blocking.preview_block(clinic.doctor_id, day(10)).await.unwrap();
    assert_eq!(preview.len(), 1);

    let conflicts = match clinic.blocking.block_date(clinic.doctor_id, day(10), None, false).await {
        Err(ScheduleError::Conflict { conflicts }) => conflicts,
        other => panic!("expected a schedule conflict, got {:?}", other),
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, confirmed.id);
}

#[tokio::test]
async fn test_block_date_clear_when_only_next_day_is_booked() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 11, true))
        .await
        .unwrap();
    appointment(&clinic, at(11, 0, 0), AppointmentStatus::Confirmed).await;

    let result = clinic.blocking.block_date(clinic.doctor_id, day(10), None, false).await.unwrap();

    assert_eq!(result.blocked_slots, 10);
    let next_day = clinic.availability.list_slots(clinic.doctor_id, day(11), day(11)).await.unwrap();
    assert!(next_day.iter().all(|slot| slot.status == SlotStatus::Available));
}

#[tokio::test]
async fn test_force_block_blocks_every_slot_and_keeps_appointments() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();
    let confirmed = appointment(&clinic, at(10, 9, 0), AppointmentStatus::Confirmed).await;
    let target = all_slots(&clinic).await[2].clone();
    clinic.store.book_slot(clinic.doctor_id, target.id).await.unwrap();

    let result = clinic
        .blocking
        .block_date(clinic.doctor_id, day(10), Some("Congreso".to_string()), true)
        .await
        .unwrap();

    assert_eq!(result.blocked_from, at(10, 0, 0));
    assert_eq!(result.blocked_to, at(11, 0, 0));
    assert_eq!(result.blocked_slots, 10);
    for slot in all_slots(&clinic).await {
        assert_eq!(slot.status, SlotStatus::Blocked);
        assert_eq!(slot.block_reason.as_deref(), Some("Congreso"));
    }

    let stored = clinic.ledger.get(confirmed.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_block_range_between_instants() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();

    let request = BlockRequest {
        start: BlockBoundary::Instant(at(10, 10, 15)),
        end: BlockBoundary::Instant(at(10, 11, 0)),
        reason: None,
        force: false,
    };
    let result = clinic.blocking.block_range(clinic.doctor_id, &request).await.unwrap();

    // 10:00, 10:30 overlap; 11:00 starts at the window end.
    assert_eq!(result.blocked_slots, 2);

    let inverted = BlockRequest {
        start: BlockBoundary::Instant(at(10, 11, 0)),
        end: BlockBoundary::Instant(at(10, 10, 0)),
        reason: None,
        force: false,
    };
    assert_matches!(
        clinic.blocking.block_range(clinic.doctor_id, &inverted).await,
        Err(ScheduleError::Validation(_))
    );
}

#[tokio::test]
async fn test_blocked_slot_cannot_be_booked() {
    let clinic = clinic();
    clinic
        .availability
        .configure_schedule(&morning(clinic.doctor_id, 10, 10, true))
        .await
        .unwrap();
    clinic.blocking.block_date(clinic.doctor_id, day(10), None, false).await.unwrap();

    let slot = all_slots(&clinic).await[0].clone();
    assert_matches!(
        clinic.store.book_slot(clinic.doctor_id, slot.id).await,
        Err(ScheduleError::SlotUnavailable { status: SlotStatus::Blocked, .. })
    );
}

#[tokio::test]
async fn test_preview_returns_whole_day_in_any_status() {
    let clinic = clinic();
    let early = appointment(&clinic, at(10, 0, 0), AppointmentStatus::Completed).await;
    let late = appointment(&clinic, at(10, 23, 30), AppointmentStatus::Scheduled).await;
    appointment(&clinic, at(11, 0, 0), AppointmentStatus::Scheduled).await;

    let preview = clinic.blocking.preview_block(clinic.doctor_id, day(10)).await.unwrap();

    let ids: Vec<_> = preview.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);
    assert!(all_slots(&clinic).await.is_empty());
}

#[tokio::test]
async fn test_clinic_timezone_shapes_local_days() {
    let store = Arc::new(SlotStore::new());
    let lima: Tz = "America/Lima".parse().unwrap();
    let availability = AvailabilityService::new(store, lima);
    let doctor_id = Uuid::new_v4();

    availability
        .configure_schedule(&morning(doctor_id, 10, 10, true))
        .await
        .unwrap();

    let slots = availability.list_slots(doctor_id, day(10), day(10)).await.unwrap();
    assert_eq!(slots.len(), 10);
    assert_eq!(slots[0].start, at(10, 13, 0));
}
