pub mod ledger;
pub mod lifecycle;
pub mod supabase_ledger;

pub use ledger::{AppointmentLedger, InMemoryAppointmentLedger};
pub use lifecycle::AppointmentLifecycleService;
pub use supabase_ledger::SupabaseAppointmentLedger;
