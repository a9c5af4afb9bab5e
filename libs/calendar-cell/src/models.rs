use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveTime, NaiveDate};

/// Weekly working window for one professional. Breaks are stored inline
/// as a jsonb column on the `work_schedules` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    #[serde(default)]
    pub breaks: Vec<BreakInterval>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakInterval {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

/// Leave/vacation entry. Any date inside the range blocks scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Absence {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkScheduleRequest {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: Option<bool>,
    pub breaks: Option<Vec<BreakInterval>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWorkScheduleRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
    pub breaks: Option<Vec<BreakInterval>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAbsenceRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Appointment fields the grid needs for positioning. The appointment
/// cell owns the full record; this is the calendar's read-side view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentBlock {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
}

/// A block positioned on the 0-100% vertical day axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedBlock {
    pub label: String,
    pub start_time: String,
    pub end_time: String,
    pub top_percent: f64,
    pub height_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedAppointment {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub status: String,
    pub start_time: String,
    pub end_time: String,
    pub top_percent: f64,
    pub height_percent: f64,
}

/// Full rendering payload for one professional's day column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayGridResponse {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub window_start: String,
    pub window_end: String,
    pub window_minutes: i32,
    pub appointments: Vec<PositionedAppointment>,
    pub breaks: Vec<PositionedBlock>,
    pub free_slots: Vec<PositionedBlock>,
}

/// Shared vertical axis for the whole-team day view: the union envelope
/// of every active professional's working hours for that weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayWindowResponse {
    pub date: NaiveDate,
    pub window_start: String,
    pub window_end: String,
    pub window_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulableResponse {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub schedulable: bool,
}
