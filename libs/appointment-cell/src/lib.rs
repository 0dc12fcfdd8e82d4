pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use tracing::{info, warn};

use shared_config::AppConfig;

pub use error::AppointmentError;
pub use models::*;
pub use router::appointment_routes;
pub use services::*;

/// Picks the Supabase ledger when configured, otherwise an in-memory one.
pub fn ledger_from_config(config: &AppConfig) -> Arc<dyn AppointmentLedger> {
    if config.is_configured() {
        info!("Using Supabase appointment ledger at {}", config.supabase_url);
        Arc::new(SupabaseAppointmentLedger::new(config))
    } else {
        warn!("Supabase not configured, appointments are kept in memory");
        Arc::new(InMemoryAppointmentLedger::new())
    }
}
