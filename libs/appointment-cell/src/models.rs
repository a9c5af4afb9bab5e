use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveTime, NaiveDate, Duration};

/// Free-form status: any value can be set from the edit flow, no workflow
/// ordering is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Pending,
    Cancelled,
    Completed,
    NoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub user_id: Uuid,
    pub consultation_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub diagnosis: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub user_id: Uuid,
    pub consultation_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub consultation_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub diagnosis: Option<String>,
}

/// Row from the `user_services` link table: which services a professional
/// actually offers, used for compatibility filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserService {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Option<f64>,
}

/// Keeps end time and duration in sync from whatever the form provided.
/// End time wins when both are present; a missing pair falls back to the
/// default duration.
pub fn resolve_times(
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    duration_minutes: Option<i32>,
    default_duration: i32,
) -> Result<(NaiveTime, i32)> {
    match (end_time, duration_minutes) {
        (Some(end), _) => {
            let minutes = (end - start_time).num_minutes();
            if minutes <= 0 {
                return Err(anyhow!("End time must be after start time"));
            }
            Ok((end, minutes as i32))
        }
        (None, Some(duration)) => {
            if duration <= 0 {
                return Err(anyhow!("Duration must be positive"));
            }
            let end = start_time + Duration::minutes(duration as i64);
            if end <= start_time {
                return Err(anyhow!("Appointment must not cross midnight"));
            }
            Ok((end, duration))
        }
        (None, None) => {
            let end = start_time + Duration::minutes(default_duration as i64);
            if end <= start_time {
                return Err(anyhow!("Appointment must not cross midnight"));
            }
            Ok((end, default_duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn end_time_wins_over_duration() {
        let (end, minutes) = resolve_times(t(10, 0), Some(t(10, 45)), Some(30), 30).unwrap();
        assert_eq!(end, t(10, 45));
        assert_eq!(minutes, 45);
    }

    #[test]
    fn duration_derives_end_time() {
        let (end, minutes) = resolve_times(t(10, 0), None, Some(90), 30).unwrap();
        assert_eq!(end, t(11, 30));
        assert_eq!(minutes, 90);
    }

    #[test]
    fn default_duration_applies_when_nothing_given() {
        let (end, minutes) = resolve_times(t(10, 0), None, None, 30).unwrap();
        assert_eq!(end, t(10, 30));
        assert_eq!(minutes, 30);
    }

    #[test]
    fn rejects_inverted_or_degenerate_ranges() {
        assert!(resolve_times(t(10, 0), Some(t(10, 0)), None, 30).is_err());
        assert!(resolve_times(t(10, 0), Some(t(9, 0)), None, 30).is_err());
        assert!(resolve_times(t(10, 0), None, Some(0), 30).is_err());
        assert!(resolve_times(t(23, 45), None, Some(30), 30).is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AppointmentStatus::NoShow).unwrap(), "\"no_show\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::Cancelled);
    }
}
