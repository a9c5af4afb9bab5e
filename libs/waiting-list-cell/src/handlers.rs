use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateWaitingListRequest, PromoteRequest, TimePreference, UpdateWaitingListRequest};
use crate::services::WaitingListService;
use crate::services::waiting_list::WaitingListFilter;

#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    pub organization_id: String,
    pub user_id: Option<String>,
    pub service_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub time_preference: Option<TimePreference>,
}

#[axum::debug_handler]
pub async fn create_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateWaitingListRequest>,
) -> Result<Json<Value>, AppError> {
    let service = WaitingListService::new(&state);
    let entry = service
        .create_entry(request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn get_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(entry_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = WaitingListService::new(&state);
    let entry = service
        .get_entry(&entry_id, auth.token())
        .await
        .map_err(|_| AppError::NotFound("Waiting list entry not found".to_string()))?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn list_entries(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Value>, AppError> {
    let service = WaitingListService::new(&state);
    let filter = WaitingListFilter {
        user_id: query.user_id,
        service_id: query.service_id,
        date_from: query.date_from,
        date_to: query.date_to,
        time_preference: query.time_preference,
    };

    let entries = service
        .list_entries(&query.organization_id, filter, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "entries": entries,
        "total": entries.len()
    })))
}

#[axum::debug_handler]
pub async fn update_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(entry_id): Path<String>,
    Json(request): Json<UpdateWaitingListRequest>,
) -> Result<Json<Value>, AppError> {
    let service = WaitingListService::new(&state);
    let entry = service
        .update_entry(&entry_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn delete_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(entry_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = WaitingListService::new(&state);
    service
        .delete_entry(&entry_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn promote_entry(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(entry_id): Path<String>,
    Json(request): Json<PromoteRequest>,
) -> Result<Json<Value>, AppError> {
    let service = WaitingListService::new(&state);
    let appointment = service
        .promote_entry(&entry_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(appointment)))
}
