use anyhow::{Result, anyhow};
use chrono::{Datelike, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BillingContact, CreateInvoiceRequest, Invoice, compute_totals};
use crate::services::pdf;

pub struct InvoiceService {
    supabase: SupabaseClient,
}

impl InvoiceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Next invoice number for the organization. Read and increment are
    /// two separate requests, so concurrent creation can hand out the
    /// same number. Acknowledged gap, not a guarantee.
    async fn next_invoice_number(
        &self,
        organization_id: &Uuid,
        auth_token: &str,
    ) -> Result<String> {
        let path = format!(
            "/rest/v1/organizations?id=eq.{}&select=invoice_counter",
            organization_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let counter = result
            .first()
            .and_then(|row| row.get("invoice_counter"))
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow!("Organization has no invoice counter"))?;

        let update_path = format!("/rest/v1/organizations?id=eq.{}", organization_id);
        let _: Vec<Value> = self.supabase.request(
            Method::PATCH,
            &update_path,
            Some(auth_token),
            Some(json!({ "invoice_counter": counter + 1 })),
        ).await?;

        Ok(format!("{}-{:04}", Utc::now().year(), counter))
    }

    async fn get_billing_contact(
        &self,
        client_id: &Uuid,
        auth_token: &str,
    ) -> Result<BillingContact> {
        let path = format!(
            "/rest/v1/clients?id=eq.{}&select=first_name,last_name,tax_id,address,postal_code,city,province",
            client_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Client not found"));
        }

        let contact: BillingContact = serde_json::from_value(result[0].clone())?;
        Ok(contact)
    }

    /// Create the invoice row, then render and attach the PDF. A failed
    /// render leaves the invoice without a pdf_url rather than failing
    /// the whole creation.
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
        auth_token: &str,
    ) -> Result<Invoice> {
        if request.lines.is_empty() {
            return Err(anyhow!("Invoice must have at least one line"));
        }
        for line in &request.lines {
            if line.quantity <= 0.0 || line.unit_price < 0.0 {
                return Err(anyhow!("Line quantity must be positive and price non-negative"));
            }
        }

        let totals = compute_totals(&request.lines);
        let invoice_number = self
            .next_invoice_number(&request.organization_id, auth_token)
            .await?;
        let issue_date = request.issue_date.unwrap_or_else(|| Utc::now().date_naive());

        debug!(
            "Creating invoice {} for client {} (total {:.2})",
            invoice_number, request.client_id, totals.total
        );

        let invoice_data = json!({
            "organization_id": request.organization_id,
            "client_id": request.client_id,
            "appointment_id": request.appointment_id,
            "invoice_number": invoice_number,
            "issue_date": issue_date,
            "base_amount": totals.base_amount,
            "vat_amount": totals.vat_amount,
            "irpf_amount": totals.irpf_amount,
            "retention_amount": totals.retention_amount,
            "discount_amount": totals.discount_amount,
            "total": totals.total,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/invoices",
            Some(auth_token),
            Some(invoice_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create invoice"));
        }

        let mut invoice: Invoice = serde_json::from_value(result[0].clone())?;

        // Lines go into their own table in a second request. No rollback:
        // a failed line insert leaves the invoice row behind.
        let line_rows: Vec<Value> = request.lines
            .iter()
            .map(|line| json!({
                "invoice_id": invoice.id,
                "description": line.description,
                "quantity": line.quantity,
                "unit_price": line.unit_price,
                "discount_percent": line.discount_percent,
                "vat_percent": line.vat_percent,
                "irpf_percent": line.irpf_percent,
                "retention_percent": line.retention_percent
            }))
            .collect();

        let _: Vec<Value> = self.supabase.request(
            Method::POST,
            "/rest/v1/invoice_lines",
            Some(auth_token),
            Some(Value::Array(line_rows)),
        ).await.map_err(|e| {
            anyhow!("Invoice {} saved but its lines were not: {}", invoice.invoice_number, e)
        })?;

        invoice.lines = request.lines;

        match self.render_and_attach_pdf(&invoice, auth_token).await {
            Ok(url) => invoice.pdf_url = Some(url),
            Err(e) => warn!("Invoice {} created without PDF: {}", invoice.invoice_number, e),
        }

        Ok(invoice)
    }

    async fn render_and_attach_pdf(
        &self,
        invoice: &Invoice,
        auth_token: &str,
    ) -> Result<String> {
        let contact = self.get_billing_contact(&invoice.client_id, auth_token).await?;
        let bytes = pdf::render_invoice(invoice, &contact)?;

        let object_path = format!("{}/{}.pdf", invoice.organization_id, invoice.invoice_number);
        let storage_path = self.supabase.upload_object(
            "invoices",
            &object_path,
            bytes,
            "application/pdf",
            auth_token,
        ).await?;
        let url = self.supabase.get_public_url(&storage_path);

        let path = format!("/rest/v1/invoices?id=eq.{}", invoice.id);
        let _: Vec<Value> = self.supabase.request(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "pdf_url": url })),
        ).await?;

        Ok(url)
    }

    pub async fn get_invoice(
        &self,
        invoice_id: &str,
        auth_token: &str,
    ) -> Result<Invoice> {
        let path = format!(
            "/rest/v1/invoices?id=eq.{}&select=*,lines:invoice_lines(*)",
            invoice_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Invoice not found"));
        }

        let invoice: Invoice = serde_json::from_value(result[0].clone())?;
        Ok(invoice)
    }

    pub async fn list_invoices(
        &self,
        organization_id: &str,
        client_id: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<Invoice>> {
        let mut path = format!(
            "/rest/v1/invoices?organization_id=eq.{}&select=*,lines:invoice_lines(*)&order=invoice_number.desc",
            organization_id
        );
        if let Some(client_id) = client_id {
            path.push_str(&format!("&client_id=eq.{}", client_id));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let invoices: Vec<Invoice> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Invoice>, _>>()?;

        Ok(invoices)
    }
}
