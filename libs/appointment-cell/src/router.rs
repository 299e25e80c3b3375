// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::AppointmentWorkflowService;

#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub workflow: Arc<AppointmentWorkflowService>,
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        // Requester
        .route("/", post(handlers::submit_appointment))
        .route("/mine", get(handlers::list_my_appointments))
        .route("/slots/count", get(handlers::get_slot_count))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/slip", get(handlers::get_appointment_slip))

        // Office review
        .route("/office/{office}", get(handlers::list_office_appointments))
        .route("/calendar", get(handlers::get_calendar))
        .route("/{appointment_id}/approve", post(handlers::approve_appointment))
        .route("/{appointment_id}/decline", post(handlers::decline_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/suspensions", post(handlers::suspend_office))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
