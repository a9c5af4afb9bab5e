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

use crate::models::{CreateClientRequest, UpdateClientRequest};
use crate::services::{ClientService, SearchService};

#[derive(Debug, Deserialize)]
pub struct ListClientsQuery {
    pub organization_id: String,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchClientsQuery {
    pub organization_id: String,
    pub q: String,
}

#[axum::debug_handler]
pub async fn create_client(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let client_service = ClientService::new(&state);
    let organization_id = request.organization_id.to_string();

    let client = client_service
        .create_client(&organization_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(client)))
}

#[axum::debug_handler]
pub async fn get_client(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let client_service = ClientService::new(&state);
    let client = client_service
        .get_client(&client_id, auth.token())
        .await
        .map_err(|_| AppError::NotFound("Client not found".to_string()))?;

    Ok(Json(json!(client)))
}

#[axum::debug_handler]
pub async fn list_clients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<Value>, AppError> {
    let client_service = ClientService::new(&state);
    let clients = client_service
        .list_clients(&query.organization_id, query.limit, query.offset, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "clients": clients,
        "total": clients.len()
    })))
}

#[axum::debug_handler]
pub async fn update_client(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(client_id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let client_service = ClientService::new(&state);
    let client = client_service
        .update_client(&client_id, request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(client)))
}

/// Free-text candidate search. Callers should debounce (~300ms) before
/// hitting this endpoint; stale in-flight responses are not cancelled.
#[axum::debug_handler]
pub async fn search_clients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SearchClientsQuery>,
) -> Result<Json<Value>, AppError> {
    let search_service = SearchService::new(&state);
    let hits = search_service
        .search_clients(&query.organization_id, &query.q, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "results": hits,
        "total": hits.len()
    })))
}
