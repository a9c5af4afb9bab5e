use anyhow::{Result, anyhow};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use appointment_cell::services::BookingService;
use appointment_cell::models::{Appointment, CreateAppointmentRequest};

use crate::models::{
    CreateWaitingListRequest, PromoteRequest, TimePreference, UpdateWaitingListRequest,
    WaitingListEntry,
};

pub struct WaitingListFilter {
    pub user_id: Option<String>,
    pub service_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub time_preference: Option<TimePreference>,
}

pub struct WaitingListService {
    supabase: SupabaseClient,
    booking: BookingService,
}

impl WaitingListService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            booking: BookingService::new(config),
        }
    }

    pub async fn create_entry(
        &self,
        request: CreateWaitingListRequest,
        auth_token: &str,
    ) -> Result<WaitingListEntry> {
        debug!("Adding client {} to waiting list", request.client_id);

        if let (Some(from), Some(to)) = (request.date_from, request.date_to) {
            if to < from {
                return Err(anyhow!("Date range end must not precede its start"));
            }
        }

        let entry_data = json!({
            "organization_id": request.organization_id,
            "client_id": request.client_id,
            "preferred_user_id": request.preferred_user_id,
            "preferred_service_id": request.preferred_service_id,
            "date_from": request.date_from,
            "date_to": request.date_to,
            "time_preference": request.time_preference,
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/waiting_list",
            Some(auth_token),
            Some(entry_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create waiting list entry"));
        }

        let entry: WaitingListEntry = serde_json::from_value(result[0].clone())?;
        Ok(entry)
    }

    pub async fn get_entry(
        &self,
        entry_id: &str,
        auth_token: &str,
    ) -> Result<WaitingListEntry> {
        let path = format!("/rest/v1/waiting_list?id=eq.{}", entry_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Waiting list entry not found"));
        }

        let entry: WaitingListEntry = serde_json::from_value(result[0].clone())?;
        Ok(entry)
    }

    pub async fn list_entries(
        &self,
        organization_id: &str,
        filter: WaitingListFilter,
        auth_token: &str,
    ) -> Result<Vec<WaitingListEntry>> {
        let mut path = format!(
            "/rest/v1/waiting_list?organization_id=eq.{}&order=created_at.asc",
            organization_id
        );

        if let Some(ref user_id) = filter.user_id {
            path.push_str(&format!("&preferred_user_id=eq.{}", user_id));
        }
        if let Some(ref service_id) = filter.service_id {
            path.push_str(&format!("&preferred_service_id=eq.{}", service_id));
        }
        // Entries whose window overlaps the requested window.
        if let Some(ref date_from) = filter.date_from {
            path.push_str(&format!("&or=(date_to.is.null,date_to.gte.{})", date_from));
        }
        if let Some(ref date_to) = filter.date_to {
            path.push_str(&format!("&or=(date_from.is.null,date_from.lte.{})", date_to));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let mut entries: Vec<WaitingListEntry> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<WaitingListEntry>, _>>()?;

        // `any` on either side matches; applied here rather than in the
        // query so a stored `any` entry still shows under a narrow filter.
        if let Some(wanted) = filter.time_preference {
            if wanted != TimePreference::Any {
                entries.retain(|e| {
                    e.time_preference == wanted || e.time_preference == TimePreference::Any
                });
            }
        }

        Ok(entries)
    }

    pub async fn update_entry(
        &self,
        entry_id: &str,
        request: UpdateWaitingListRequest,
        auth_token: &str,
    ) -> Result<WaitingListEntry> {
        debug!("Updating waiting list entry {}", entry_id);

        let mut update_data = serde_json::Map::new();

        if let Some(user_id) = request.preferred_user_id {
            update_data.insert("preferred_user_id".to_string(), json!(user_id));
        }
        if let Some(service_id) = request.preferred_service_id {
            update_data.insert("preferred_service_id".to_string(), json!(service_id));
        }
        if let Some(date_from) = request.date_from {
            update_data.insert("date_from".to_string(), json!(date_from));
        }
        if let Some(date_to) = request.date_to {
            update_data.insert("date_to".to_string(), json!(date_to));
        }
        if let Some(time_preference) = request.time_preference {
            update_data.insert("time_preference".to_string(), json!(time_preference));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/waiting_list?id=eq.{}", entry_id);
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
            return Err(anyhow!("Failed to update waiting list entry"));
        }

        let entry: WaitingListEntry = serde_json::from_value(result[0].clone())?;
        Ok(entry)
    }

    pub async fn delete_entry(
        &self,
        entry_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!("/rest/v1/waiting_list?id=eq.{}", entry_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;
        Ok(())
    }

    /// Turn an entry into a real appointment at a concrete slot, then
    /// remove the entry. The two steps are separate requests: if the
    /// delete fails the appointment still exists and the entry must be
    /// cleaned up by hand.
    pub async fn promote_entry(
        &self,
        entry_id: &str,
        request: PromoteRequest,
        auth_token: &str,
    ) -> Result<Appointment> {
        let entry = self.get_entry(entry_id, auth_token).await?;

        debug!(
            "Promoting waiting list entry {} to appointment on {} at {}",
            entry_id, request.date, request.start_time
        );

        let appointment = self.booking.create_appointment(
            CreateAppointmentRequest {
                organization_id: entry.organization_id,
                client_id: entry.client_id,
                user_id: request.user_id,
                consultation_id: request.consultation_id,
                service_id: request.service_id.or(entry.preferred_service_id),
                date: request.date,
                start_time: request.start_time,
                end_time: request.end_time,
                duration_minutes: request.duration_minutes,
                status: None,
                notes: entry.notes.clone(),
            },
            auth_token,
        ).await?;

        if let Err(e) = self.delete_entry(entry_id, auth_token).await {
            warn!(
                "Appointment {} created but waiting list entry {} was not removed: {}",
                appointment.id, entry_id, e
            );
            return Err(anyhow!(
                "Appointment created but the waiting list entry could not be removed"
            ));
        }

        Ok(appointment)
    }
}
