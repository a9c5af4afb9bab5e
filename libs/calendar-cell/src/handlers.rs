use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use chrono::{NaiveDate, NaiveTime};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateWorkScheduleRequest, UpdateWorkScheduleRequest, CreateAbsenceRequest, SchedulableResponse};
use crate::services::{GridService, ScheduleService};

#[derive(Debug, Deserialize)]
pub struct DayGridQuery {
    pub user_id: String,
    pub date: NaiveDate,
    pub interval: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SchedulableQuery {
    pub user_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct DayWindowQuery {
    pub date: NaiveDate,
}

/// Professionals manage only their own hours; reception and admin can
/// manage anyone's.
fn ensure_can_manage(user: &User, target_user_id: &str) -> Result<(), AppError> {
    match user.role.as_deref() {
        Some("receptionist") | Some("admin") => Ok(()),
        _ if user.id == target_user_id => Ok(()),
        _ => Err(AppError::Auth(
            "Cannot manage another professional's working hours".to_string(),
        )),
    }
}

#[axum::debug_handler]
pub async fn get_day_grid(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DayGridQuery>,
) -> Result<Json<Value>, AppError> {
    let interval = query.interval.unwrap_or(30);
    if !matches!(interval, 15 | 30 | 60) {
        return Err(AppError::ValidationError("Slot interval must be 15, 30 or 60 minutes".to_string()));
    }

    let grid_service = GridService::new(&state);
    let grid = grid_service
        .day_grid(&query.user_id, query.date, interval, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(grid)))
}

#[axum::debug_handler]
pub async fn get_day_window(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DayWindowQuery>,
) -> Result<Json<Value>, AppError> {
    let grid_service = GridService::new(&state);
    let window = grid_service
        .day_window(query.date, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(window)))
}

#[axum::debug_handler]
pub async fn check_schedulable(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SchedulableQuery>,
) -> Result<Json<Value>, AppError> {
    let grid_service = GridService::new(&state);
    let schedulable = grid_service
        .is_time_schedulable(&query.user_id, query.date, query.time, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let response = SchedulableResponse {
        user_id: uuid::Uuid::parse_str(&query.user_id)
            .map_err(|_| AppError::ValidationError("Invalid user id".to_string()))?,
        date: query.date,
        time: query.time,
        schedulable,
    };

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateWorkScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage(&user, &user_id)?;

    let schedule_service = ScheduleService::new(&state);
    let schedule = schedule_service
        .create_schedule(&user_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn get_user_schedules(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);
    let schedules = schedule_service
        .get_user_schedules(&user_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "schedules": schedules,
        "total": schedules.len()
    })))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((user_id, schedule_id)): Path<(String, String)>,
    Json(request): Json<UpdateWorkScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage(&user, &user_id)?;

    let schedule_service = ScheduleService::new(&state);
    let schedule = schedule_service
        .update_schedule(&schedule_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((user_id, schedule_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage(&user, &user_id)?;

    let schedule_service = ScheduleService::new(&state);
    schedule_service
        .delete_schedule(&schedule_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn create_absence(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateAbsenceRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage(&user, &user_id)?;

    let schedule_service = ScheduleService::new(&state);
    let absence = schedule_service
        .create_absence(&user_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(absence)))
}

#[axum::debug_handler]
pub async fn get_user_absences(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);
    let absences = schedule_service
        .get_user_absences(&user_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "absences": absences,
        "total": absences.len()
    })))
}

#[axum::debug_handler]
pub async fn delete_absence(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((user_id, absence_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage(&user, &user_id)?;

    let schedule_service = ScheduleService::new(&state);
    schedule_service
        .delete_absence(&absence_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "deleted": true })))
}
