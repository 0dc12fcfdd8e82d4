use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, ledger_from_config};
use schedule_cell::{schedule_routes, SlotStore};
use shared_config::AppConfig;
use visit_queue_cell::{visit_queue_routes, QueueCoordinator};

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let ledger = ledger_from_config(&state);
    let slots = Arc::new(SlotStore::new());
    let queues = Arc::new(QueueCoordinator::from_config(&state));

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/schedule", schedule_routes(state.clone(), slots, ledger.clone()))
        .nest("/appointments", appointment_routes(state.clone(), ledger))
        .nest("/queue", visit_queue_routes(state, queues))
}
