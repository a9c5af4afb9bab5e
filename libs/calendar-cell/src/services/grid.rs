use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AppointmentBlock, DayGridResponse, DayWindowResponse, PositionedAppointment,
    PositionedBlock, WorkSchedule,
};
use crate::services::schedule::ScheduleService;
use crate::timegrid::{
    self, TimeSegment, calendar_time_range, day_of_week,
    fragment_working_hours_around_breaks, height_for_duration, minutes_of,
    minutes_to_time, position_for_time,
};

pub struct GridService {
    supabase: SupabaseClient,
    schedules: ScheduleService,
}

impl GridService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            schedules: ScheduleService::new(config),
        }
    }

    /// Assemble one professional's day column: window envelope, positioned
    /// appointments and breaks, and the free slots left between breaks.
    pub async fn day_grid(
        &self,
        user_id: &str,
        date: NaiveDate,
        slot_interval: i32,
        auth_token: &str,
    ) -> Result<DayGridResponse> {
        debug!("Building day grid for user {} on {}", user_id, date);

        let dow = day_of_week(date);
        let schedules = self.schedules.get_user_schedules(user_id, auth_token).await?;
        let absences = self.schedules.get_absences_for_date(user_id, date, auth_token).await?;
        let appointments = self.get_appointments_for_date(user_id, date, auth_token).await?;

        let day_schedules: Vec<&WorkSchedule> = schedules
            .iter()
            .filter(|s| s.is_active && s.day_of_week == dow)
            .collect();

        let (window_start, window_end) = calendar_time_range(&schedules, dow);
        let window_minutes = window_end - window_start;

        let positioned_appointments = appointments
            .iter()
            .map(|apt| self.position_appointment(apt, window_start, window_end, window_minutes))
            .collect();

        // On an absence day the working windows are suppressed entirely;
        // existing appointments still render so staff can see what to move.
        if !absences.is_empty() {
            return Ok(DayGridResponse {
                user_id: uuid::Uuid::parse_str(user_id)?,
                date,
                window_start: minutes_to_time(window_start),
                window_end: minutes_to_time(window_end),
                window_minutes,
                appointments: positioned_appointments,
                breaks: vec![],
                free_slots: vec![],
            });
        }

        let mut break_blocks = Vec::new();
        let mut working_segments = Vec::new();
        let mut break_segments = Vec::new();

        if day_schedules.is_empty() {
            working_segments.push(TimeSegment::new(window_start, window_end));
        } else {
            for schedule in &day_schedules {
                working_segments.push(TimeSegment::new(
                    minutes_of(schedule.start_time),
                    minutes_of(schedule.end_time),
                ));
                for brk in schedule.breaks.iter().filter(|b| b.is_active) {
                    let segment = TimeSegment::new(minutes_of(brk.start_time), minutes_of(brk.end_time));
                    break_segments.push(segment);
                    break_blocks.push(PositionedBlock {
                        label: brk.name.clone(),
                        start_time: minutes_to_time(segment.start),
                        end_time: minutes_to_time(segment.end),
                        top_percent: position_for_time(segment.start, window_start, window_end),
                        height_percent: height_for_duration(segment.len(), window_minutes),
                    });
                }
            }
        }

        let free_segments =
            fragment_working_hours_around_breaks(&working_segments, &break_segments, slot_interval);

        let free_slots = free_segments
            .iter()
            .map(|segment| PositionedBlock {
                label: "free".to_string(),
                start_time: minutes_to_time(segment.start),
                end_time: minutes_to_time(segment.end),
                top_percent: position_for_time(segment.start, window_start, window_end),
                height_percent: height_for_duration(segment.len(), window_minutes),
            })
            .collect();

        Ok(DayGridResponse {
            user_id: uuid::Uuid::parse_str(user_id)?,
            date,
            window_start: minutes_to_time(window_start),
            window_end: minutes_to_time(window_end),
            window_minutes,
            appointments: positioned_appointments,
            breaks: break_blocks,
            free_slots,
        })
    }

    /// Shared axis for the whole-team day view. Every column on that view
    /// uses this envelope so appointments line up across professionals;
    /// an empty clinic falls back to the default window.
    pub async fn day_window(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<DayWindowResponse> {
        let schedules = self.schedules.get_all_active_schedules(auth_token).await?;
        let (window_start, window_end) = calendar_time_range(&schedules, day_of_week(date));

        Ok(DayWindowResponse {
            date,
            window_start: minutes_to_time(window_start),
            window_end: minutes_to_time(window_end),
            window_minutes: window_end - window_start,
        })
    }

    /// Gate used by appointment creation: absences, breaks and working
    /// hours all consulted, with the default window for unconfigured users.
    pub async fn is_time_schedulable(
        &self,
        user_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool> {
        let schedules = self.schedules.get_user_schedules(user_id, auth_token).await?;
        let absences = self.schedules.get_absences_for_date(user_id, date, auth_token).await?;

        Ok(timegrid::is_schedulable(&schedules, &absences, date, time))
    }

    // Private helper methods

    fn position_appointment(
        &self,
        apt: &AppointmentBlock,
        window_start: i32,
        window_end: i32,
        window_minutes: i32,
    ) -> PositionedAppointment {
        let start = minutes_of(apt.start_time);
        let end = minutes_of(apt.end_time);

        PositionedAppointment {
            appointment_id: apt.id,
            client_id: apt.client_id,
            status: apt.status.clone(),
            start_time: minutes_to_time(start),
            end_time: minutes_to_time(end),
            top_percent: position_for_time(start, window_start, window_end),
            height_percent: height_for_duration(end - start, window_minutes),
        }
    }

    async fn get_appointments_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AppointmentBlock>> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=eq.{}&status=neq.cancelled&order=start_time.asc",
            user_id, date
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let appointments: Vec<AppointmentBlock> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<AppointmentBlock>, _>>()?;

        Ok(appointments)
    }
}
