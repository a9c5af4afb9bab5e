use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveTime, NaiveDate, Days, Months};

/// Recurrence is declared at creation time and expanded into concrete
/// dated rows sharing a `series_id`, instead of being inferred later
/// from shared attributes and date deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recurrence {
    pub rule: RecurrenceRule,
    /// Total number of occurrences, the first one included.
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Attended,
    NoShow,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupActivity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: Uuid,
    pub service_id: Option<Uuid>,
    pub max_participants: i32,
    pub current_participants: i32,
    pub series_id: Option<Uuid>,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub client_id: Uuid,
    pub status: ParticipantStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupActivityRequest {
    pub organization_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: Uuid,
    pub service_id: Option<Uuid>,
    pub max_participants: i32,
    pub recurrence: Option<Recurrence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGroupActivityRequest {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub user_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddParticipantRequest {
    pub client_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateParticipantRequest {
    pub status: ParticipantStatus,
}

/// Expands a recurrence into concrete dates, the start date first.
/// A count of zero still yields the start date.
pub fn expand_occurrences(start: NaiveDate, recurrence: Option<&Recurrence>) -> Vec<NaiveDate> {
    let Some(recurrence) = recurrence else {
        return vec![start];
    };

    let count = recurrence.count.max(1);
    let mut dates = Vec::with_capacity(count as usize);
    let mut current = start;

    for _ in 0..count {
        dates.push(current);
        current = match recurrence.rule {
            RecurrenceRule::Daily => current.checked_add_days(Days::new(1)),
            RecurrenceRule::Weekly => current.checked_add_days(Days::new(7)),
            RecurrenceRule::Biweekly => current.checked_add_days(Days::new(14)),
            RecurrenceRule::Monthly => current.checked_add_months(Months::new(1)),
        }
        .unwrap_or(current);
    }

    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn no_recurrence_yields_single_date() {
        assert_eq!(expand_occurrences(d(2026, 4, 6), None), vec![d(2026, 4, 6)]);
    }

    #[test]
    fn weekly_advances_seven_days() {
        let recurrence = Recurrence { rule: RecurrenceRule::Weekly, count: 3 };
        assert_eq!(
            expand_occurrences(d(2026, 4, 6), Some(&recurrence)),
            vec![d(2026, 4, 6), d(2026, 4, 13), d(2026, 4, 20)]
        );
    }

    #[test]
    fn biweekly_advances_fourteen_days() {
        let recurrence = Recurrence { rule: RecurrenceRule::Biweekly, count: 2 };
        assert_eq!(
            expand_occurrences(d(2026, 4, 6), Some(&recurrence)),
            vec![d(2026, 4, 6), d(2026, 4, 20)]
        );
    }

    #[test]
    fn monthly_clamps_at_short_months() {
        let recurrence = Recurrence { rule: RecurrenceRule::Monthly, count: 3 };
        assert_eq!(
            expand_occurrences(d(2026, 1, 31), Some(&recurrence)),
            vec![d(2026, 1, 31), d(2026, 2, 28), d(2026, 3, 28)]
        );
    }

    #[test]
    fn zero_count_still_yields_start() {
        let recurrence = Recurrence { rule: RecurrenceRule::Weekly, count: 0 };
        assert_eq!(expand_occurrences(d(2026, 4, 6), Some(&recurrence)), vec![d(2026, 4, 6)]);
    }
}
