// libs/feedback-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

#[derive(Clone)]
pub struct FeedbackState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
}

pub fn feedback_routes(state: FeedbackState) -> Router {
    let protected_routes = Router::new()
        .route("/pending", get(handlers::list_pending_feedback))
        .route("/{feedback_id}/answers", post(handlers::submit_feedback_answers))
        .route("/summary/{office}", get(handlers::get_feedback_summary))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
