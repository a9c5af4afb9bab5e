use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn calendar_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        // Day grid rendering and slot gating
        .route("/day-grid", get(handlers::get_day_grid))
        .route("/day-window", get(handlers::get_day_window))
        .route("/schedulable", get(handlers::check_schedulable))

        // Working hours management
        .route("/users/{user_id}/schedules", post(handlers::create_schedule))
        .route("/users/{user_id}/schedules", get(handlers::get_user_schedules))
        .route("/users/{user_id}/schedules/{schedule_id}", put(handlers::update_schedule))
        .route("/users/{user_id}/schedules/{schedule_id}", delete(handlers::delete_schedule))

        // Leave and vacations
        .route("/users/{user_id}/absences", post(handlers::create_absence))
        .route("/users/{user_id}/absences", get(handlers::get_user_absences))
        .route("/users/{user_id}/absences/{absence_id}", delete(handlers::delete_absence))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
