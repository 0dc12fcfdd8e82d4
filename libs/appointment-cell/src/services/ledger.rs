// libs/appointment-cell/src/services/ledger.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppointmentError;
use crate::models::{Appointment, AppointmentStatus};

/// Read access to appointments plus compare-and-set status writes.
///
/// The ledger is owned outside this engine; implementations only have to
/// honour the `expected` status guard on writes.
#[async_trait]
pub trait AppointmentLedger: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Appointment, AppointmentError>;

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    /// Appointments with `from <= date <= to`, ordered by date.
    async fn list_for_doctor_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Writes `next` only if the stored status still normalizes to `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError>;
}

/// Process-local ledger for embedded use and tests.
#[derive(Default)]
pub struct InMemoryAppointmentLedger {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, appointment: Appointment) {
        debug!("Recording appointment {} for doctor {}", appointment.id, appointment.doctor_id);
        self.appointments.write().await.insert(appointment.id, appointment);
    }

    async fn collect<F>(&self, filter: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut found: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|apt| filter(apt))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        found
    }
}

#[async_trait]
impl AppointmentLedger for InMemoryAppointmentLedger {
    async fn get(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppointmentError::NotFound(id))
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(|apt| apt.doctor_id == doctor_id).await)
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(|apt| apt.patient_id == patient_id).await)
    }

    async fn list_for_doctor_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .collect(|apt| apt.doctor_id == doctor_id && apt.date >= from && apt.date <= to)
            .await)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&id).ok_or(AppointmentError::NotFound(id))?;

        if appointment.status != expected {
            return Err(AppointmentError::StaleStatus { id, expected });
        }

        appointment.status = next;
        Ok(appointment.clone())
    }
}
