pub mod coordinator;

pub use coordinator::{estimate_wait, DoctorQueue, QueueCoordinator};
