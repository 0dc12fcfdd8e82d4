use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::*;
use shared_utils::test_utils::TestConfig;

fn row(id: Uuid, doctor_id: Uuid, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "doctor_id": doctor_id,
        "patient_id": Uuid::new_v4(),
        "appointment_date": "2025-03-10T09:00:00Z",
        "status": status,
        "reason": "Chequeo",
        "created_at": "2025-03-01T00:00:00Z"
    })
}

async fn ledger_for(server: &MockServer) -> SupabaseAppointmentLedger {
    SupabaseAppointmentLedger::new(&TestConfig::with_supabase(&server.uri()).to_app_config())
}

#[tokio::test]
async fn test_rows_are_normalized_on_read() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(Uuid::new_v4(), doctor_id, "PROGRAMADA"),
            row(Uuid::new_v4(), doctor_id, "NO SHOW"),
            row(Uuid::new_v4(), doctor_id, "something-new"),
        ])))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server).await;
    let appointments = ledger.list_for_doctor(doctor_id).await.unwrap();

    let statuses: Vec<_> = appointments.iter().map(|a| a.status).collect();
    assert_eq!(
        statuses,
        vec![
            AppointmentStatus::Scheduled,
            AppointmentStatus::NoShow,
            AppointmentStatus::Scheduled
        ]
    );
    assert_eq!(appointments[0].date, Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap());
}

#[tokio::test]
async fn test_range_query_uses_inclusive_bounds() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("order", "appointment_date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(Uuid::new_v4(), doctor_id, "confirmed")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ledger = ledger_for(&server).await;
    let found = ledger
        .list_for_doctor_between(
            doctor_id,
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server).await;
    let id = Uuid::new_v4();

    assert_matches!(ledger.get(id).await, Err(AppointmentError::NotFound(missing)) if missing == id);
}

#[tokio::test]
async fn test_transition_guards_on_raw_legacy_status() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, doctor_id, "PROGRAMADA")])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.PROGRAMADA"))
        .and(body_partial_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, doctor_id, "confirmed")])))
        .expect(1)
        .mount(&server)
        .await;

    let service = AppointmentLifecycleService::new(std::sync::Arc::new(ledger_for(&server).await));
    let confirmed = service.confirm(id).await.unwrap();

    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_invalid_transition_never_patches() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, Uuid::new_v4(), "scheduled")])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = AppointmentLifecycleService::new(std::sync::Arc::new(ledger_for(&server).await));
    assert_matches!(service.complete(id).await, Err(AppointmentError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_empty_patch_result_is_stale() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(id, Uuid::new_v4(), "confirmed")])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server).await;
    let result = ledger
        .update_status(id, AppointmentStatus::Confirmed, AppointmentStatus::InProgress)
        .await;

    assert_matches!(result, Err(AppointmentError::StaleStatus { .. }));
}

#[tokio::test]
async fn test_upstream_failure_is_ledger_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let ledger = ledger_for(&server).await;
    assert_matches!(ledger.list_for_patient(Uuid::new_v4()).await, Err(AppointmentError::Ledger(_)));
}
