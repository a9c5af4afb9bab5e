use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use calendar_cell::router::calendar_routes;
use client_cell::router::client_routes;
use appointment_cell::router::appointment_routes;
use medical_history_cell::router::medical_history_routes;
use group_activity_cell::router::group_activity_routes;
use waiting_list_cell::router::waiting_list_routes;
use billing_cell::router::billing_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/calendar", calendar_routes(state.clone()))
        .nest("/clients", client_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/medical-history", medical_history_routes(state.clone()))
        .nest("/group-activities", group_activity_routes(state.clone()))
        .nest("/waiting-list", waiting_list_routes(state.clone()))
        .nest("/billing", billing_routes(state))
}
