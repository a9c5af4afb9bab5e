use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn billing_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/invoices", post(handlers::create_invoice))
        .route("/invoices", get(handlers::list_invoices))
        .route("/invoices/preview", post(handlers::preview_totals))
        .route("/invoices/{invoice_id}", get(handlers::get_invoice))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
