use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use serde_json::json;

use appointment_cell::{appointment_routes, AppointmentState, AppointmentWorkflowService};
use directory_cell::{directory_routes, DirectoryState};
use feedback_cell::{feedback_routes, FeedbackState};
use notification_cell::NotificationSender;
use shared_config::AppConfig;
use shared_database::DocumentStore;

pub fn create_router(
    config: Arc<AppConfig>,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn NotificationSender>,
) -> Router {
    let workflow = Arc::new(AppointmentWorkflowService::new(config.clone(), store.clone(), notifier));
    let sms_enabled = config.is_sms_configured();

    Router::new()
        .route("/", get(|| async { "Campus Appointments API is running!" }))
        .route(
            "/status",
            get(move || async move {
                axum::Json(json!({
                    "status": "ok",
                    "sms_enabled": sms_enabled
                }))
            }),
        )
        .nest(
            "/appointments",
            appointment_routes(AppointmentState {
                config: config.clone(),
                workflow,
            }),
        )
        .nest(
            "/directory",
            directory_routes(DirectoryState {
                config: config.clone(),
                store: store.clone(),
            }),
        )
        .nest("/feedback", feedback_routes(FeedbackState { config, store }))
}
