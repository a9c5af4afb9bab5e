use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, patch, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn group_activity_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_activity))
        .route("/", get(handlers::list_activities))
        .route("/series/{series_id}", get(handlers::get_series))
        .route("/series/{series_id}", delete(handlers::delete_series))
        .route("/{activity_id}", get(handlers::get_activity))
        .route("/{activity_id}", put(handlers::update_activity))
        .route("/{activity_id}", delete(handlers::delete_activity))
        .route("/{activity_id}/participants", post(handlers::add_participant))
        .route("/{activity_id}/participants", get(handlers::get_participants))
        .route("/{activity_id}/participants/{participant_id}", patch(handlers::update_participant))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
