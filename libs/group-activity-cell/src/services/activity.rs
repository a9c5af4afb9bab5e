use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    GroupActivity, Participant, ParticipantStatus,
    CreateGroupActivityRequest, UpdateGroupActivityRequest,
    expand_occurrences,
};

pub struct ActivityService {
    supabase: SupabaseClient,
}

impl ActivityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create an activity, expanding a recurrence into one row per
    /// occurrence. All rows of a recurring activity share `series_id`.
    pub async fn create_activity(
        &self,
        request: CreateGroupActivityRequest,
        auth_token: &str,
    ) -> Result<Vec<GroupActivity>> {
        debug!("Creating group activity '{}' on {}", request.name, request.date);

        if request.name.trim().is_empty() {
            return Err(anyhow!("Activity name is required"));
        }
        if request.start_time >= request.end_time {
            return Err(anyhow!("Start time must be before end time"));
        }
        if request.max_participants <= 0 {
            return Err(anyhow!("Max participants must be positive"));
        }

        let dates = expand_occurrences(request.date, request.recurrence.as_ref());
        let series_id = (dates.len() > 1).then(Uuid::new_v4);
        let recurrence_rule = request.recurrence.as_ref().map(|r| r.rule);

        let rows: Vec<Value> = dates
            .iter()
            .map(|date| json!({
                "organization_id": request.organization_id,
                "name": request.name,
                "date": date,
                "start_time": request.start_time.format("%H:%M:%S").to_string(),
                "end_time": request.end_time.format("%H:%M:%S").to_string(),
                "user_id": request.user_id,
                "service_id": request.service_id,
                "max_participants": request.max_participants,
                "current_participants": 0,
                "series_id": series_id,
                "recurrence_rule": recurrence_rule,
                "created_at": Utc::now().to_rfc3339(),
                "updated_at": Utc::now().to_rfc3339()
            }))
            .collect();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/group_activities",
            Some(auth_token),
            Some(Value::Array(rows)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create group activity"));
        }

        let activities: Vec<GroupActivity> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<GroupActivity>, _>>()?;

        debug!("Created {} activity occurrence(s)", activities.len());
        Ok(activities)
    }

    pub async fn get_activity(
        &self,
        activity_id: &str,
        auth_token: &str,
    ) -> Result<GroupActivity> {
        let path = format!("/rest/v1/group_activities?id=eq.{}", activity_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Group activity not found"));
        }

        let activity: GroupActivity = serde_json::from_value(result[0].clone())?;
        Ok(activity)
    }

    pub async fn list_activities(
        &self,
        organization_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<GroupActivity>> {
        let mut path = format!(
            "/rest/v1/group_activities?organization_id=eq.{}&order=date.asc,start_time.asc",
            organization_id
        );
        if let Some(from) = from {
            path.push_str(&format!("&date=gte.{}", from));
        }
        if let Some(to) = to {
            path.push_str(&format!("&date=lte.{}", to));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let activities: Vec<GroupActivity> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<GroupActivity>, _>>()?;

        Ok(activities)
    }

    /// All occurrences of one series, ordered by date.
    pub async fn get_series(
        &self,
        series_id: &str,
        auth_token: &str,
    ) -> Result<Vec<GroupActivity>> {
        let path = format!(
            "/rest/v1/group_activities?series_id=eq.{}&order=date.asc",
            series_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let activities: Vec<GroupActivity> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<GroupActivity>, _>>()?;

        Ok(activities)
    }

    pub async fn update_activity(
        &self,
        activity_id: &str,
        request: UpdateGroupActivityRequest,
        auth_token: &str,
    ) -> Result<GroupActivity> {
        debug!("Updating group activity: {}", activity_id);

        if let (Some(start), Some(end)) = (request.start_time, request.end_time) {
            if start >= end {
                return Err(anyhow!("Start time must be before end time"));
            }
        }

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(date) = request.date {
            update_data.insert("date".to_string(), json!(date));
        }
        if let Some(start_time) = request.start_time {
            update_data.insert("start_time".to_string(), json!(start_time.format("%H:%M:%S").to_string()));
        }
        if let Some(end_time) = request.end_time {
            update_data.insert("end_time".to_string(), json!(end_time.format("%H:%M:%S").to_string()));
        }
        if let Some(user_id) = request.user_id {
            update_data.insert("user_id".to_string(), json!(user_id));
        }
        if let Some(service_id) = request.service_id {
            update_data.insert("service_id".to_string(), json!(service_id));
        }
        if let Some(max_participants) = request.max_participants {
            if max_participants <= 0 {
                return Err(anyhow!("Max participants must be positive"));
            }
            update_data.insert("max_participants".to_string(), json!(max_participants));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/group_activities?id=eq.{}", activity_id);
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
            return Err(anyhow!("Failed to update group activity"));
        }

        let activity: GroupActivity = serde_json::from_value(result[0].clone())?;
        Ok(activity)
    }

    pub async fn delete_activity(
        &self,
        activity_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!("/rest/v1/group_activities?id=eq.{}", activity_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }

    /// Delete every remaining occurrence of a series from a date onward.
    pub async fn delete_series_from(
        &self,
        series_id: &str,
        from: NaiveDate,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!(
            "/rest/v1/group_activities?series_id=eq.{}&date=gte.{}",
            series_id, from
        );
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }

    /// Register a client. The capacity check and the counter bump are two
    /// separate requests; near-simultaneous registrations can overbook.
    pub async fn add_participant(
        &self,
        activity_id: &str,
        client_id: &str,
        auth_token: &str,
    ) -> Result<Participant> {
        debug!("Adding participant {} to activity {}", client_id, activity_id);

        let activity = self.get_activity(activity_id, auth_token).await?;

        if activity.current_participants >= activity.max_participants {
            return Err(anyhow!("Activity is full"));
        }

        let existing_path = format!(
            "/rest/v1/group_activity_participants?activity_id=eq.{}&client_id=eq.{}&status=neq.cancelled",
            activity_id, client_id
        );
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            return Err(anyhow!("Client is already registered for this activity"));
        }

        let participant_data = json!({
            "activity_id": activity_id,
            "client_id": client_id,
            "status": ParticipantStatus::Registered,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/group_activity_participants",
            Some(auth_token),
            Some(participant_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to register participant"));
        }

        self.set_participant_count(activity_id, activity.current_participants + 1, auth_token).await?;

        let participant: Participant = serde_json::from_value(result[0].clone())?;
        Ok(participant)
    }

    pub async fn get_participants(
        &self,
        activity_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Participant>> {
        let path = format!(
            "/rest/v1/group_activity_participants?activity_id=eq.{}&order=created_at.asc",
            activity_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let participants: Vec<Participant> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Participant>, _>>()?;

        Ok(participants)
    }

    pub async fn update_participant_status(
        &self,
        participant_id: &str,
        status: ParticipantStatus,
        auth_token: &str,
    ) -> Result<Participant> {
        let update_data = json!({ "status": status });

        let path = format!("/rest/v1/group_activity_participants?id=eq.{}", participant_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Participant not found"));
        }

        let participant: Participant = serde_json::from_value(result[0].clone())?;

        // A cancellation frees the seat
        if status == ParticipantStatus::Cancelled {
            let activity_id = participant.activity_id.to_string();
            let activity = self.get_activity(&activity_id, auth_token).await?;
            self.set_participant_count(
                &activity_id,
                (activity.current_participants - 1).max(0),
                auth_token,
            ).await?;
        }

        Ok(participant)
    }

    // Private helper methods

    async fn set_participant_count(
        &self,
        activity_id: &str,
        count: i32,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!("/rest/v1/group_activities?id=eq.{}", activity_id);
        let update = json!({
            "current_participants": count,
            "updated_at": Utc::now().to_rfc3339()
        });

        let _: Vec<Value> = self.supabase.request(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update),
        ).await?;

        Ok(())
    }
}
