use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use appointment_cell::services::AppointmentLedger;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, ScheduleState};
use crate::services::{AvailabilityService, BlockingService, SlotStore};

pub fn schedule_routes(
    config: Arc<AppConfig>,
    store: Arc<SlotStore>,
    ledger: Arc<dyn AppointmentLedger>,
) -> Router {
    let timezone = config.clinic_timezone;
    let state = ScheduleState {
        config: config.clone(),
        store: store.clone(),
        availability: Arc::new(AvailabilityService::new(store.clone(), timezone)),
        blocking: Arc::new(BlockingService::new(store, ledger, timezone)),
    };

    Router::new()
        .route("/{doctor_id}", get(handlers::get_schedule))
        .route("/{doctor_id}", post(handlers::configure_schedule))

        // Blocking
        .route("/{doctor_id}/block", patch(handlers::block_schedule))
        .route("/{doctor_id}/block/preview", get(handlers::preview_block))

        .route("/{doctor_id}/slots/{slot_id}/book", post(handlers::book_slot))

        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
