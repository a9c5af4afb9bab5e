use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime};

/// When in the day the client would like to be seen. `Any` matches
/// everything when filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    Morning,
    Afternoon,
    Any,
}

impl Default for TimePreference {
    fn default() -> Self {
        TimePreference::Any
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub preferred_user_id: Option<Uuid>,
    pub preferred_service_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub time_preference: TimePreference,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWaitingListRequest {
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub preferred_user_id: Option<Uuid>,
    pub preferred_service_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub time_preference: TimePreference,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWaitingListRequest {
    pub preferred_user_id: Option<Uuid>,
    pub preferred_service_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub time_preference: Option<TimePreference>,
    pub notes: Option<String>,
}

/// Concrete slot chosen by the receptionist when promoting an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteRequest {
    pub user_id: Uuid,
    pub service_id: Option<Uuid>,
    pub consultation_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_preference_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TimePreference::Morning).unwrap(), "\"morning\"");
        let parsed: TimePreference = serde_json::from_str("\"any\"").unwrap();
        assert_eq!(parsed, TimePreference::Any);
    }

    #[test]
    fn time_preference_defaults_to_any() {
        let request: CreateWaitingListRequest = serde_json::from_value(serde_json::json!({
            "organization_id": "7f5130a8-5a0a-4d07-a152-3c15e6c57c16",
            "client_id": "f5c5b3d0-8cd4-4be6-a2ba-59a2ce6d62bc"
        }))
        .unwrap();
        assert_eq!(request.time_preference, TimePreference::Any);
    }
}
