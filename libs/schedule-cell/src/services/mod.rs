pub mod availability;
pub mod blocking;
pub mod calendar;
pub mod store;

pub use availability::AvailabilityService;
pub use blocking::BlockingService;
pub use store::{DoctorSlots, SlotStore};
