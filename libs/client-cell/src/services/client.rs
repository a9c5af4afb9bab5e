use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Client, CreateClientRequest, UpdateClientRequest};

pub struct ClientService {
    supabase: SupabaseClient,
}

impl ClientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_client(
        &self,
        organization_id: &str,
        request: CreateClientRequest,
        auth_token: &str,
    ) -> Result<Client> {
        debug!("Creating client {} {}", request.first_name, request.last_name);

        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(anyhow!("First and last name are required"));
        }

        if let Some(ref phone) = request.phone {
            validate_phone(phone)?;
        }

        let client_data = json!({
            "organization_id": organization_id,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "tax_id": request.tax_id,
            "address": request.address,
            "postal_code": request.postal_code,
            "city": request.city,
            "province": request.province,
            "date_of_birth": request.date_of_birth,
            "gender": request.gender,
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/clients",
            Some(auth_token),
            Some(client_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create client"));
        }

        let client: Client = serde_json::from_value(result[0].clone())?;
        debug!("Client created with ID: {}", client.id);

        Ok(client)
    }

    pub async fn get_client(
        &self,
        client_id: &str,
        auth_token: &str,
    ) -> Result<Client> {
        debug!("Fetching client: {}", client_id);

        let path = format!("/rest/v1/clients?id=eq.{}", client_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Client not found"));
        }

        let client: Client = serde_json::from_value(result[0].clone())?;
        Ok(client)
    }

    pub async fn list_clients(
        &self,
        organization_id: &str,
        limit: Option<i32>,
        offset: Option<i32>,
        auth_token: &str,
    ) -> Result<Vec<Client>> {
        let path = format!(
            "/rest/v1/clients?organization_id=eq.{}&order=last_name.asc,first_name.asc&limit={}&offset={}",
            organization_id,
            limit.unwrap_or(50),
            offset.unwrap_or(0)
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let clients: Vec<Client> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Client>, _>>()?;

        Ok(clients)
    }

    /// Clients are never deleted from this code path, only updated.
    pub async fn update_client(
        &self,
        client_id: &str,
        request: UpdateClientRequest,
        auth_token: &str,
    ) -> Result<Client> {
        debug!("Updating client: {}", client_id);

        if let Some(ref phone) = request.phone {
            validate_phone(phone)?;
        }

        let mut update_data = serde_json::Map::new();

        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(tax_id) = request.tax_id {
            update_data.insert("tax_id".to_string(), json!(tax_id));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(postal_code) = request.postal_code {
            update_data.insert("postal_code".to_string(), json!(postal_code));
        }
        if let Some(city) = request.city {
            update_data.insert("city".to_string(), json!(city));
        }
        if let Some(province) = request.province {
            update_data.insert("province".to_string(), json!(province));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            update_data.insert("date_of_birth".to_string(), json!(date_of_birth));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/clients?id=eq.{}", client_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update client"));
        }

        let client: Client = serde_json::from_value(result[0].clone())?;
        Ok(client)
    }
}

fn validate_phone(phone: &str) -> Result<()> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let valid_chars = phone.chars().all(|c| {
        c.is_ascii_digit() || c == '+' || c == ' ' || c == '-' || c == '(' || c == ')'
    });

    if digits < 7 || !valid_chars {
        return Err(anyhow!("Invalid phone format: {}", phone));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_phone_formats() {
        assert!(validate_phone("612345678").is_ok());
        assert!(validate_phone("+34 612 345 678").is_ok());
        assert!(validate_phone("(91) 123-45-67").is_ok());
    }

    #[test]
    fn rejects_short_or_garbled_phones() {
        assert!(validate_phone("612").is_err());
        assert!(validate_phone("not-a-phone").is_err());
        assert!(validate_phone("612345678x").is_err());
    }
}
