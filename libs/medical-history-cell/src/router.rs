use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn medical_history_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/clients/{client_id}", get(handlers::get_history))
        .route("/clients/{client_id}", put(handlers::upsert_history))
        .route("/clients/{client_id}/follow-ups", get(handlers::get_client_follow_ups))
        .route("/follow-ups", post(handlers::create_follow_up))
        .route("/follow-ups/{follow_up_id}", delete(handlers::delete_follow_up))
        .route("/transcribe", post(handlers::transcribe_audio))
        .route("/enhance", post(handlers::enhance_text))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
