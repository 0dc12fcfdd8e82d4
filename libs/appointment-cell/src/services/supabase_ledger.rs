// libs/appointment-cell/src/services/supabase_ledger.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::AppointmentError;
use crate::models::{Appointment, AppointmentStatus};
use crate::services::ledger::AppointmentLedger;

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";

/// Row shape of the `appointments` table. Status stays raw until normalized.
#[derive(Debug, Clone, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    appointment_date: DateTime<Utc>,
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

impl AppointmentRow {
    fn into_appointment(self) -> Appointment {
        let status = AppointmentStatus::normalize(&self.status);
        if status.as_str() != self.status {
            debug!("Normalized status {:?} -> {} for appointment {}", self.status, status, self.id);
        }

        Appointment {
            id: self.id,
            doctor_id: self.doctor_id,
            patient_id: self.patient_id,
            date: self.appointment_date,
            status,
            reason: self.reason,
        }
    }
}

/// Ledger backed by the clinic's Supabase `appointments` table.
pub struct SupabaseAppointmentLedger {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentLedger {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_rows(&self, query: &str) -> Result<Vec<AppointmentRow>, AppointmentError> {
        let path = format!("{}?{}", APPOINTMENTS_PATH, query);
        self.supabase
            .request::<Vec<AppointmentRow>>(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppointmentError::Ledger(e.to_string()))
    }

    async fn fetch_row(&self, id: Uuid) -> Result<AppointmentRow, AppointmentError> {
        self.fetch_rows(&format!("id=eq.{}&limit=1", id))
            .await?
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound(id))
    }

    async fn fetch_appointments(&self, query: &str) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .fetch_rows(query)
            .await?
            .into_iter()
            .map(AppointmentRow::into_appointment)
            .collect())
    }
}

fn timestamp_param(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl AppointmentLedger for SupabaseAppointmentLedger {
    async fn get(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        Ok(self.fetch_row(id).await?.into_appointment())
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_appointments(&format!(
            "doctor_id=eq.{}&order=appointment_date.asc",
            doctor_id
        ))
        .await
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_appointments(&format!(
            "patient_id=eq.{}&order=appointment_date.asc",
            patient_id
        ))
        .await
    }

    async fn list_for_doctor_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_appointments(&format!(
            "doctor_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&order=appointment_date.asc",
            doctor_id,
            timestamp_param(from),
            timestamp_param(to)
        ))
        .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        // Guard on the raw stored value so legacy spellings still match.
        let current = self.fetch_row(id).await?;
        if AppointmentStatus::normalize(&current.status) != expected {
            return Err(AppointmentError::StaleStatus { id, expected });
        }

        let path = format!(
            "{}?id=eq.{}&status=eq.{}",
            APPOINTMENTS_PATH,
            id,
            urlencoding::encode(&current.status)
        );
        let body = json!({
            "status": next.as_str(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<AppointmentRow> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::Ledger(e.to_string()))?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.into_appointment()),
            None => {
                warn!("Status guard rejected update of appointment {} ({} -> {})", id, expected, next);
                Err(AppointmentError::StaleStatus { id, expected })
            }
        }
    }
}
