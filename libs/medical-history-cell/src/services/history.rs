use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{MedicalHistory, UpsertMedicalHistoryRequest, compute_imc};

pub struct HistoryService {
    supabase: SupabaseClient,
}

impl HistoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_history(
        &self,
        client_id: &str,
        auth_token: &str,
    ) -> Result<Option<MedicalHistory>> {
        debug!("Fetching medical history for client: {}", client_id);

        let path = format!("/rest/v1/medical_histories?client_id=eq.{}", client_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Ok(None);
        }

        let history: MedicalHistory = serde_json::from_value(result[0].clone())?;
        Ok(Some(history))
    }

    /// Single upsert per client. The BMI field is recomputed here whenever
    /// both weight and height are present, so stored records never carry a
    /// stale value.
    pub async fn upsert_history(
        &self,
        client_id: &str,
        mut request: UpsertMedicalHistoryRequest,
        auth_token: &str,
    ) -> Result<MedicalHistory> {
        debug!("Upserting medical history for client: {}", client_id);

        request.imc = compute_imc(request.weight_kg, request.height_cm).or(request.imc.take());

        let mut history_data = serde_json::to_value(&request)?;
        let obj = history_data
            .as_object_mut()
            .ok_or_else(|| anyhow!("Medical history did not serialize to an object"))?;
        obj.insert("client_id".to_string(), json!(client_id));
        obj.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        obj.remove("created_at");

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let path = "/rest/v1/medical_histories?on_conflict=client_id";
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            path,
            Some(auth_token),
            Some(history_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to save medical history"));
        }

        let history: MedicalHistory = serde_json::from_value(result[0].clone())?;
        Ok(history)
    }
}
