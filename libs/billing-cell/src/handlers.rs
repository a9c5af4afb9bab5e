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

use crate::models::{CreateInvoiceRequest, InvoiceLine, compute_totals};
use crate::services::InvoiceService;

#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub organization_id: String,
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub lines: Vec<InvoiceLine>,
}

#[axum::debug_handler]
pub async fn create_invoice(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = InvoiceService::new(&state);
    let invoice = service
        .create_invoice(request, auth.token())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(json!(invoice)))
}

#[axum::debug_handler]
pub async fn get_invoice(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(invoice_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = InvoiceService::new(&state);
    let invoice = service
        .get_invoice(&invoice_id, auth.token())
        .await
        .map_err(|_| AppError::NotFound("Invoice not found".to_string()))?;

    Ok(Json(json!(invoice)))
}

#[axum::debug_handler]
pub async fn list_invoices(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Value>, AppError> {
    let service = InvoiceService::new(&state);
    let invoices = service
        .list_invoices(&query.organization_id, query.client_id.as_deref(), auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "invoices": invoices,
        "total": invoices.len()
    })))
}

/// Totals for a set of lines without persisting anything. Backs the live
/// amounts shown while the invoice form is being filled in.
#[axum::debug_handler]
pub async fn preview_totals(
    Json(request): Json<PreviewRequest>,
) -> Result<Json<Value>, AppError> {
    let totals = compute_totals(&request.lines);
    Ok(Json(json!(totals)))
}
