use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use chrono::NaiveDate;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    CreateGroupActivityRequest, UpdateGroupActivityRequest,
    AddParticipantRequest, UpdateParticipantRequest,
};
use crate::services::ActivityService;

#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    pub organization_id: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSeriesQuery {
    pub from: NaiveDate,
}

#[axum::debug_handler]
pub async fn create_activity(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateGroupActivityRequest>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let activities = activity_service
        .create_activity(request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!({
        "activities": activities,
        "total": activities.len()
    })))
}

#[axum::debug_handler]
pub async fn get_activity(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(activity_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let activity = activity_service
        .get_activity(&activity_id, auth.token())
        .await
        .map_err(|_| AppError::NotFound("Group activity not found".to_string()))?;

    Ok(Json(json!(activity)))
}

#[axum::debug_handler]
pub async fn list_activities(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ListActivitiesQuery>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let activities = activity_service
        .list_activities(&query.organization_id, query.from, query.to, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "activities": activities,
        "total": activities.len()
    })))
}

#[axum::debug_handler]
pub async fn get_series(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(series_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let activities = activity_service
        .get_series(&series_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "activities": activities,
        "total": activities.len()
    })))
}

#[axum::debug_handler]
pub async fn update_activity(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(activity_id): Path<String>,
    Json(request): Json<UpdateGroupActivityRequest>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let activity = activity_service
        .update_activity(&activity_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(activity)))
}

#[axum::debug_handler]
pub async fn delete_activity(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(activity_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    activity_service
        .delete_activity(&activity_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn delete_series(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(series_id): Path<String>,
    Query(query): Query<DeleteSeriesQuery>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    activity_service
        .delete_series_from(&series_id, query.from, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn add_participant(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(activity_id): Path<String>,
    Json(request): Json<AddParticipantRequest>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let participant = activity_service
        .add_participant(&activity_id, &request.client_id.to_string(), auth.token())
        .await
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    Ok(Json(json!(participant)))
}

#[axum::debug_handler]
pub async fn get_participants(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(activity_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let participants = activity_service
        .get_participants(&activity_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "participants": participants,
        "total": participants.len()
    })))
}

#[axum::debug_handler]
pub async fn update_participant(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((_activity_id, participant_id)): Path<(String, String)>,
    Json(request): Json<UpdateParticipantRequest>,
) -> Result<Json<Value>, AppError> {
    let activity_service = ActivityService::new(&state);
    let participant = activity_service
        .update_participant_status(&participant_id, request.status, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(participant)))
}
