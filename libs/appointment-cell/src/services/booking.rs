use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use calendar_cell::services::GridService;

use crate::models::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, UpdateAppointmentRequest,
    Service, UserService, resolve_times,
};

const DEFAULT_APPOINTMENT_MINUTES: i32 = 30;

pub struct BookingService {
    supabase: SupabaseClient,
    grid: GridService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            grid: GridService::new(config),
        }
    }

    /// Create an appointment after compatibility, schedulability and
    /// conflict checks. Last-write-wins on concurrent edits; there is no
    /// optimistic locking here.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment> {
        debug!(
            "Creating appointment for client {} with professional {} on {}",
            request.client_id, request.user_id, request.date
        );

        let default_duration = match request.service_id {
            Some(service_id) => {
                let service = self.get_service(&service_id.to_string(), auth_token).await?;
                self.check_professional_offers_service(
                    &request.user_id.to_string(),
                    &service_id.to_string(),
                    auth_token,
                ).await?;
                service.duration_minutes
            }
            None => DEFAULT_APPOINTMENT_MINUTES,
        };

        let (end_time, duration_minutes) = resolve_times(
            request.start_time,
            request.end_time,
            request.duration_minutes,
            default_duration,
        )?;

        let schedulable = self.grid
            .is_time_schedulable(
                &request.user_id.to_string(),
                request.date,
                request.start_time,
                auth_token,
            )
            .await?;

        if !schedulable {
            return Err(anyhow!(
                "Time {} on {} is outside the professional's working hours",
                request.start_time.format("%H:%M"),
                request.date
            ));
        }

        self.check_booking_conflicts(
            &request.user_id.to_string(),
            request.date,
            request.start_time,
            end_time,
            None,
            auth_token,
        ).await?;

        let appointment_data = json!({
            "organization_id": request.organization_id,
            "client_id": request.client_id,
            "user_id": request.user_id,
            "consultation_id": request.consultation_id,
            "service_id": request.service_id,
            "date": request.date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": end_time.format("%H:%M:%S").to_string(),
            "duration_minutes": duration_minutes,
            "status": request.status.unwrap_or(AppointmentStatus::Pending),
            "notes": request.notes,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create appointment"));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())?;
        debug!("Appointment created with ID: {}", appointment.id);

        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Appointment not found"));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())?;
        Ok(appointment)
    }

    pub async fn get_appointments_for_day(
        &self,
        user_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=eq.{}&order=start_time.asc",
            user_id, date
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let appointments: Vec<Appointment> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Appointment>, _>>()?;

        Ok(appointments)
    }

    /// Partial update. Status transitions are deliberately free-form:
    /// any status can be set from the edit flow.
    pub async fn update_appointment(
        &self,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        let date = request.date.unwrap_or(current.date);
        let start_time = request.start_time.unwrap_or(current.start_time);
        let time_changed = request.date.is_some()
            || request.start_time.is_some()
            || request.end_time.is_some()
            || request.duration_minutes.is_some();

        let mut update_data = serde_json::Map::new();

        if time_changed {
            let (end_time, duration_minutes) = resolve_times(
                start_time,
                request.end_time,
                request.duration_minutes,
                current.duration_minutes,
            )?;

            self.check_booking_conflicts(
                &current.user_id.to_string(),
                date,
                start_time,
                end_time,
                Some(appointment_id),
                auth_token,
            ).await?;

            update_data.insert("date".to_string(), json!(date));
            update_data.insert("start_time".to_string(), json!(start_time.format("%H:%M:%S").to_string()));
            update_data.insert("end_time".to_string(), json!(end_time.format("%H:%M:%S").to_string()));
            update_data.insert("duration_minutes".to_string(), json!(duration_minutes));
        }

        if let Some(consultation_id) = request.consultation_id {
            update_data.insert("consultation_id".to_string(), json!(consultation_id));
        }
        if let Some(service_id) = request.service_id {
            self.check_professional_offers_service(
                &current.user_id.to_string(),
                &service_id.to_string(),
                auth_token,
            ).await?;
            update_data.insert("service_id".to_string(), json!(service_id));
        }
        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        if let Some(diagnosis) = request.diagnosis {
            update_data.insert("diagnosis".to_string(), json!(diagnosis));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
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
            return Err(anyhow!("Failed to update appointment"));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())?;
        Ok(appointment)
    }

    pub async fn set_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment> {
        let request = UpdateAppointmentRequest {
            consultation_id: None,
            service_id: None,
            date: None,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            status: Some(status),
            notes: None,
            diagnosis: None,
        };
        self.update_appointment(appointment_id, request, auth_token).await
    }

    // Private helper methods

    async fn get_service(
        &self,
        service_id: &str,
        auth_token: &str,
    ) -> Result<Service> {
        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Service not found"));
        }

        let service: Service = serde_json::from_value(result[0].clone())?;
        Ok(service)
    }

    /// Professionals can only take appointments for services they are
    /// linked to in `user_services`.
    async fn check_professional_offers_service(
        &self,
        user_id: &str,
        service_id: &str,
        auth_token: &str,
    ) -> Result<()> {
        let path = format!(
            "/rest/v1/user_services?user_id=eq.{}&service_id=eq.{}",
            user_id, service_id
        );

        let links: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if links.is_empty() {
            warn!("Professional {} does not offer service {}", user_id, service_id);
            return Err(anyhow!("Selected professional does not offer this service"));
        }

        let _: Vec<UserService> = links.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<UserService>, _>>()?;

        Ok(())
    }

    async fn check_booking_conflicts(
        &self,
        user_id: &str,
        date: NaiveDate,
        start_time: chrono::NaiveTime,
        end_time: chrono::NaiveTime,
        exclude_id: Option<&str>,
        auth_token: &str,
    ) -> Result<()> {
        let mut path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=eq.{}&status=in.(confirmed,pending)",
            user_id, date
        );

        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<Appointment> = self.supabase.request::<Vec<Value>>(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Appointment>, _>>()?;

        for appointment in existing {
            if start_time < appointment.end_time && end_time > appointment.start_time {
                return Err(anyhow!(
                    "Appointment overlaps an existing booking from {} to {}",
                    appointment.start_time.format("%H:%M"),
                    appointment.end_time.format("%H:%M")
                ));
            }
        }

        Ok(())
    }
}
