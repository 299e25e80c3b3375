// libs/directory-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, put},
    Router,
};

use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

#[derive(Clone)]
pub struct DirectoryState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
}

pub fn directory_routes(state: DirectoryState) -> Router {
    let protected_routes = Router::new()
        .route("/offices", get(handlers::list_offices))
        .route("/offices/{office}", get(handlers::get_office).put(handlers::update_office))
        .route("/services", get(handlers::list_services).post(handlers::create_service))
        .route("/services/{service_id}", put(handlers::update_service).delete(handlers::delete_service))
        .route("/holidays", get(handlers::list_holidays).post(handlers::create_holiday))
        .route("/holidays/{holiday_id}", delete(handlers::delete_holiday))
        .route("/accounts/{user_id}", get(handlers::get_account))
        .route("/accounts/{user_id}/role", patch(handlers::change_account_role))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
