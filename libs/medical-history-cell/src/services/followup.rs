use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{PatientFollowUp, CreateFollowUpRequest};

pub struct FollowUpService {
    supabase: SupabaseClient,
}

impl FollowUpService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_follow_up(
        &self,
        request: CreateFollowUpRequest,
        auth_token: &str,
    ) -> Result<PatientFollowUp> {
        debug!("Creating follow-up for client: {}", request.client_id);

        if request.description.trim().is_empty() {
            return Err(anyhow!("Follow-up description is required"));
        }

        let follow_up_data = json!({
            "client_id": request.client_id,
            "date": request.date,
            "description": request.description,
            "recommendations": request.recommendations,
            "follow_up_type": request.follow_up_type,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patient_follow_ups",
            Some(auth_token),
            Some(follow_up_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create follow-up"));
        }

        let follow_up: PatientFollowUp = serde_json::from_value(result[0].clone())?;
        Ok(follow_up)
    }

    pub async fn get_client_follow_ups(
        &self,
        client_id: &str,
        auth_token: &str,
    ) -> Result<Vec<PatientFollowUp>> {
        let path = format!(
            "/rest/v1/patient_follow_ups?client_id=eq.{}&order=date.desc",
            client_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let follow_ups: Vec<PatientFollowUp> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<PatientFollowUp>, _>>()?;

        Ok(follow_ups)
    }

    pub async fn delete_follow_up(
        &self,
        follow_up_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!("/rest/v1/patient_follow_ups?id=eq.{}", follow_up_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }
}
