use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    WorkSchedule, Absence,
    CreateWorkScheduleRequest, UpdateWorkScheduleRequest, CreateAbsenceRequest,
};

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create a working window for a professional on one weekday
    pub async fn create_schedule(
        &self,
        user_id: &str,
        request: CreateWorkScheduleRequest,
        auth_token: &str,
    ) -> Result<WorkSchedule> {
        debug!("Creating work schedule for user: {}", user_id);

        if request.start_time >= request.end_time {
            return Err(anyhow!("Start time must be before end time"));
        }

        if request.day_of_week < 0 || request.day_of_week > 6 {
            return Err(anyhow!("Day of week must be between 0 (Sunday) and 6 (Saturday)"));
        }

        if let Some(ref breaks) = request.breaks {
            for brk in breaks {
                if brk.start_time >= brk.end_time {
                    return Err(anyhow!("Break '{}' has an invalid time range", brk.name));
                }
            }
        }

        self.check_schedule_conflicts(
            user_id,
            request.day_of_week,
            &request,
            None,
            auth_token,
        ).await?;

        let schedule_data = json!({
            "user_id": user_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "is_active": request.is_active.unwrap_or(true),
            "breaks": request.breaks.unwrap_or_default(),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/work_schedules",
            Some(auth_token),
            Some(schedule_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create work schedule"));
        }

        let schedule: WorkSchedule = serde_json::from_value(result[0].clone())?;
        debug!("Work schedule created with ID: {}", schedule.id);

        Ok(schedule)
    }

    /// Update a working window, replacing breaks wholesale when provided
    pub async fn update_schedule(
        &self,
        schedule_id: &str,
        request: UpdateWorkScheduleRequest,
        auth_token: &str,
    ) -> Result<WorkSchedule> {
        debug!("Updating work schedule: {}", schedule_id);

        let current = self.get_schedule_by_id(schedule_id, auth_token).await?;

        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);

        if start_time >= end_time {
            return Err(anyhow!("Start time must be before end time"));
        }

        let mut update_data = serde_json::Map::new();

        if let Some(start) = request.start_time {
            update_data.insert("start_time".to_string(), json!(start.format("%H:%M:%S").to_string()));
        }
        if let Some(end) = request.end_time {
            update_data.insert("end_time".to_string(), json!(end.format("%H:%M:%S").to_string()));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }
        if let Some(breaks) = request.breaks {
            for brk in &breaks {
                if brk.start_time >= brk.end_time {
                    return Err(anyhow!("Break '{}' has an invalid time range", brk.name));
                }
            }
            update_data.insert("breaks".to_string(), json!(breaks));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/work_schedules?id=eq.{}", schedule_id);
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
            return Err(anyhow!("Failed to update work schedule"));
        }

        let updated: WorkSchedule = serde_json::from_value(result[0].clone())?;
        Ok(updated)
    }

    /// All schedules for one professional, ordered by weekday then start
    pub async fn get_user_schedules(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Vec<WorkSchedule>> {
        debug!("Fetching work schedules for user: {}", user_id);

        let path = format!(
            "/rest/v1/work_schedules?user_id=eq.{}&order=day_of_week.asc,start_time.asc",
            user_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let schedules: Vec<WorkSchedule> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<WorkSchedule>, _>>()?;

        Ok(schedules)
    }

    /// Active schedules for every professional, used for the grid envelope
    pub async fn get_all_active_schedules(
        &self,
        auth_token: &str,
    ) -> Result<Vec<WorkSchedule>> {
        let path = "/rest/v1/work_schedules?is_active=eq.true&order=user_id.asc,day_of_week.asc";
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await?;

        let schedules: Vec<WorkSchedule> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<WorkSchedule>, _>>()?;

        Ok(schedules)
    }

    pub async fn delete_schedule(
        &self,
        schedule_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Deleting work schedule: {}", schedule_id);

        let path = format!("/rest/v1/work_schedules?id=eq.{}", schedule_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }

    /// Record a leave/vacation range for a professional
    pub async fn create_absence(
        &self,
        user_id: &str,
        request: CreateAbsenceRequest,
        auth_token: &str,
    ) -> Result<Absence> {
        debug!("Creating absence for user {} from {} to {}", user_id, request.start_date, request.end_date);

        if request.start_date > request.end_date {
            return Err(anyhow!("Absence start date must not be after end date"));
        }

        let absence_data = json!({
            "user_id": user_id,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "reason": request.reason,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/absences",
            Some(auth_token),
            Some(absence_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create absence"));
        }

        let absence: Absence = serde_json::from_value(result[0].clone())?;
        Ok(absence)
    }

    /// Absences covering a given date for one professional
    pub async fn get_absences_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Absence>> {
        let path = format!(
            "/rest/v1/absences?user_id=eq.{}&start_date=lte.{}&end_date=gte.{}",
            user_id, date, date
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let absences: Vec<Absence> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Absence>, _>>()?;

        Ok(absences)
    }

    pub async fn get_user_absences(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Absence>> {
        let path = format!(
            "/rest/v1/absences?user_id=eq.{}&order=start_date.asc",
            user_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let absences: Vec<Absence> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Absence>, _>>()?;

        Ok(absences)
    }

    pub async fn delete_absence(
        &self,
        absence_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!("/rest/v1/absences?id=eq.{}", absence_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }

    // Private helper methods

    async fn get_schedule_by_id(
        &self,
        schedule_id: &str,
        auth_token: &str,
    ) -> Result<WorkSchedule> {
        let path = format!("/rest/v1/work_schedules?id=eq.{}", schedule_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Work schedule not found"));
        }

        let schedule: WorkSchedule = serde_json::from_value(result[0].clone())?;
        Ok(schedule)
    }

    async fn check_schedule_conflicts(
        &self,
        user_id: &str,
        day_of_week: i32,
        request: &CreateWorkScheduleRequest,
        exclude_id: Option<&str>,
        auth_token: &str,
    ) -> Result<()> {
        let mut path = format!(
            "/rest/v1/work_schedules?user_id=eq.{}&day_of_week=eq.{}",
            user_id, day_of_week
        );

        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<WorkSchedule> = self.supabase.request::<Vec<Value>>(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<WorkSchedule>, _>>()?;

        for schedule in existing {
            if request.start_time < schedule.end_time && request.end_time > schedule.start_time {
                return Err(anyhow!("Working hours overlap an existing schedule for that day"));
            }
        }

        Ok(())
    }
}
