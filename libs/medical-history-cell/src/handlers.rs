use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{UpsertMedicalHistoryRequest, CreateFollowUpRequest, EnhanceTextRequest};
use crate::services::{HistoryService, FollowUpService, TranscriptionService};

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let history_service = HistoryService::new(&state);
    let history = history_service
        .get_history(&client_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match history {
        Some(record) => Ok(Json(json!(record))),
        None => Ok(Json(json!({ "client_id": client_id, "exists": false }))),
    }
}

#[axum::debug_handler]
pub async fn upsert_history(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(client_id): Path<String>,
    Json(request): Json<UpsertMedicalHistoryRequest>,
) -> Result<Json<Value>, AppError> {
    let history_service = HistoryService::new(&state);
    let history = history_service
        .upsert_history(&client_id, request, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(history)))
}

#[axum::debug_handler]
pub async fn create_follow_up(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateFollowUpRequest>,
) -> Result<Json<Value>, AppError> {
    let follow_up_service = FollowUpService::new(&state);
    let follow_up = follow_up_service
        .create_follow_up(request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(follow_up)))
}

#[axum::debug_handler]
pub async fn get_client_follow_ups(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let follow_up_service = FollowUpService::new(&state);
    let follow_ups = follow_up_service
        .get_client_follow_ups(&client_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "follow_ups": follow_ups,
        "total": follow_ups.len()
    })))
}

#[axum::debug_handler]
pub async fn delete_follow_up(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(follow_up_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let follow_up_service = FollowUpService::new(&state);
    follow_up_service
        .delete_follow_up(&follow_up_id, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "deleted": true })))
}

/// Accepts a multipart form with an `audio` file part and a `clientName`
/// text part; returns structured follow-up fields.
#[axum::debug_handler]
pub async fn transcribe_audio(
    State(state): State<Arc<AppConfig>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let transcription_service = TranscriptionService::new(&state)
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let mut audio_bytes: Option<Vec<u8>> = None;
    let mut file_name = "note.webm".to_string();
    let mut client_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        match field.name() {
            Some("audio") => {
                if let Some(name) = field.file_name() {
                    file_name = name.to_string();
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read audio: {}", e)))?;
                audio_bytes = Some(bytes.to_vec());
            }
            Some("clientName") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read client name: {}", e)))?;
                client_name = Some(text);
            }
            _ => {}
        }
    }

    let audio = audio_bytes
        .ok_or_else(|| AppError::ValidationError("Missing audio part".to_string()))?;
    let name = client_name
        .ok_or_else(|| AppError::ValidationError("Missing clientName part".to_string()))?;

    let result = transcription_service
        .transcribe_audio(audio, file_name, &name)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn enhance_text(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<EnhanceTextRequest>,
) -> Result<Json<Value>, AppError> {
    let transcription_service = TranscriptionService::new(&state)
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let result = transcription_service
        .enhance_text(request)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(Json(json!(result)))
}
