// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppointmentError;
use crate::models::{Appointment, AppointmentAction};
use crate::services::ledger::AppointmentLedger;

/// Drives appointment status through the named lifecycle actions.
pub struct AppointmentLifecycleService {
    ledger: Arc<dyn AppointmentLedger>,
}

impl AppointmentLifecycleService {
    pub fn new(ledger: Arc<dyn AppointmentLedger>) -> Self {
        Self { ledger }
    }

    /// Applies `action` to the appointment; invalid moves are rejected untouched.
    pub async fn apply(
        &self,
        appointment_id: Uuid,
        action: AppointmentAction,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.ledger.get(appointment_id).await?;
        debug!("Applying {} to appointment {} ({})", action, appointment_id, current.status);

        let next = action.target(current.status).ok_or_else(|| {
            warn!("Rejected {} on appointment {} in status {}", action, appointment_id, current.status);
            AppointmentError::InvalidTransition {
                action,
                from: current.status,
            }
        })?;

        let updated = self.ledger.update_status(appointment_id, current.status, next).await?;
        info!("Appointment {} transitioned {} -> {}", appointment_id, current.status, next);

        Ok(updated)
    }

    pub async fn confirm(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentAction::Confirm).await
    }

    pub async fn start(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentAction::Start).await
    }

    pub async fn complete(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentAction::Complete).await
    }

    pub async fn mark_no_show(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentAction::MarkNoShow).await
    }

    pub async fn cancel(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.apply(appointment_id, AppointmentAction::Cancel).await
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.ledger.get(appointment_id).await
    }

    pub async fn doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.ledger.list_for_doctor(doctor_id).await
    }

    pub async fn patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.ledger.list_for_patient(patient_id).await
    }
}
