pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::QueueError;
pub use models::*;
pub use router::visit_queue_routes;
pub use services::*;
