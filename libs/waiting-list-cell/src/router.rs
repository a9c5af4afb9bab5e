use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn waiting_list_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_entry))
        .route("/", get(handlers::list_entries))
        .route("/{entry_id}", get(handlers::get_entry))
        .route("/{entry_id}", put(handlers::update_entry))
        .route("/{entry_id}", delete(handlers::delete_entry))
        .route("/{entry_id}/promote", post(handlers::promote_entry))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
