// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Appointment {
    /// Live appointments are the ones that make a blocking request conflict.
    pub fn blocks_schedule(&self) -> bool {
        self.status.is_active()
    }
}

/// Canonical appointment status. Every value arriving from outside goes through
/// [`AppointmentStatus::normalize`], including JSON deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::InProgress
        )
    }

    /// Maps upstream status strings (English or Spanish, any casing) onto the
    /// canonical set. Unknown values fall back to `Scheduled`.
    pub fn normalize(raw: &str) -> Self {
        let mut key = String::with_capacity(raw.len());
        for c in raw.trim().chars().flat_map(char::to_lowercase) {
            let c = if c == '-' || c.is_whitespace() { '_' } else { c };
            if c == '_' && key.ends_with('_') {
                continue;
            }
            key.push(c);
        }

        match key.as_str() {
            "scheduled" | "pending" | "booked" | "programada" | "programado" | "pendiente"
            | "agendada" | "agendado" | "reservada" => AppointmentStatus::Scheduled,
            "confirmed" | "confirmada" | "confirmado" => AppointmentStatus::Confirmed,
            "in_progress" | "inprogress" | "started" | "ongoing" | "en_curso" | "en_progreso"
            | "en_proceso" | "iniciada" | "en_consulta" => AppointmentStatus::InProgress,
            "completed" | "complete" | "done" | "finished" | "completada" | "completado"
            | "finalizada" | "finalizado" | "atendida" | "atendido" => AppointmentStatus::Completed,
            "cancelled" | "canceled" | "cancelada" | "cancelado" | "anulada" | "anulado" => {
                AppointmentStatus::Cancelled
            }
            "no_show" | "noshow" | "no_asistio" | "no_asistió" | "ausente" | "inasistencia" => {
                AppointmentStatus::NoShow
            }
            _ => {
                debug!("Unrecognized appointment status {:?}, treating as scheduled", raw);
                AppointmentStatus::Scheduled
            }
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AppointmentStatus::normalize(&raw))
    }
}

/// Named lifecycle actions; status is never written free-form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Confirm,
    Start,
    Complete,
    MarkNoShow,
    Cancel,
}

impl AppointmentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentAction::Confirm => "confirm",
            AppointmentAction::Start => "start",
            AppointmentAction::Complete => "complete",
            AppointmentAction::MarkNoShow => "mark-no-show",
            AppointmentAction::Cancel => "cancel",
        }
    }

    /// Status reached by applying this action from `from`, if allowed.
    pub fn target(&self, from: AppointmentStatus) -> Option<AppointmentStatus> {
        use AppointmentStatus::*;
        match (self, from) {
            (AppointmentAction::Confirm, Scheduled) => Some(Confirmed),
            (AppointmentAction::Start, Scheduled | Confirmed) => Some(InProgress),
            (AppointmentAction::Complete, InProgress) => Some(Completed),
            (AppointmentAction::MarkNoShow, Scheduled | Confirmed) => Some(NoShow),
            (AppointmentAction::Cancel, status) if !status.is_terminal() => Some(Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_legacy_vocabulary() {
        assert_eq!(AppointmentStatus::normalize("PROGRAMADA"), AppointmentStatus::Scheduled);
        assert_eq!(AppointmentStatus::normalize("NO SHOW"), AppointmentStatus::NoShow);
        assert_eq!(AppointmentStatus::normalize("no-show"), AppointmentStatus::NoShow);
        assert_eq!(AppointmentStatus::normalize(" Confirmada "), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::normalize("EN  CURSO"), AppointmentStatus::InProgress);
        assert_eq!(AppointmentStatus::normalize("In-Progress"), AppointmentStatus::InProgress);
        assert_eq!(AppointmentStatus::normalize("Canceled"), AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::normalize("Atendida"), AppointmentStatus::Completed);
    }

    #[test]
    fn unknown_status_falls_back_to_scheduled() {
        assert_eq!(AppointmentStatus::normalize("GARBAGE"), AppointmentStatus::Scheduled);
        assert_eq!(AppointmentStatus::normalize(""), AppointmentStatus::Scheduled);
    }

    #[test]
    fn canonical_names_round_trip_through_normalize() {
        for status in AppointmentStatus::ALL {
            assert_eq!(AppointmentStatus::normalize(status.as_str()), status);
        }
    }

    #[test]
    fn deserialization_normalizes() {
        let status: AppointmentStatus = serde_json::from_str("\"NO SHOW\"").unwrap();
        assert_eq!(status, AppointmentStatus::NoShow);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"no_show\"");
    }

    #[test]
    fn transition_table() {
        use AppointmentAction::*;
        use AppointmentStatus::*;

        assert_eq!(Confirm.target(Scheduled), Some(Confirmed));
        assert_eq!(Start.target(Confirmed), Some(InProgress));
        assert_eq!(Start.target(Scheduled), Some(InProgress));
        assert_eq!(Complete.target(InProgress), Some(Completed));
        assert_eq!(MarkNoShow.target(Confirmed), Some(NoShow));
        assert_eq!(Cancel.target(InProgress), Some(Cancelled));

        assert_eq!(Complete.target(Scheduled), None);
        assert_eq!(Confirm.target(Confirmed), None);
        assert_eq!(MarkNoShow.target(InProgress), None);
        for terminal in [Completed, Cancelled, NoShow] {
            assert_eq!(Cancel.target(terminal), None);
            assert_eq!(Start.target(terminal), None);
        }
    }
}
