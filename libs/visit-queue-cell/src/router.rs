use std::sync::Arc;
use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;
use crate::handlers::{
    QueueState,
    join_queue,
    call_next,
    get_current,
    get_waiting,
    get_queue_stats,
    get_position,
    complete_ticket,
    cancel_ticket,
};
use crate::services::QueueCoordinator;

pub fn visit_queue_routes(config: Arc<AppConfig>, coordinator: Arc<QueueCoordinator>) -> Router {
    Router::new()
        .route("/join", post(join_queue))
        .route("/call-next", post(call_next))
        .route("/doctor/{doctor_id}/current", get(get_current))
        .route("/doctor/{doctor_id}/waiting", get(get_waiting))
        .route("/doctor/{doctor_id}/stats", get(get_queue_stats))
        .route("/ticket/{ticket_id}/position", get(get_position))
        .route("/ticket/{ticket_id}/complete", post(complete_ticket))
        .route("/ticket/{ticket_id}/cancel", post(cancel_ticket))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(QueueState { coordinator })
}
