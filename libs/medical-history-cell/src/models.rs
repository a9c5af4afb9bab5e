use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

/// User-defined extension entry hanging off a medical history record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomField {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub section: String,
    pub order: i32,
}

/// One record per client. Free-text fields are grouped the way the intake
/// form presents them; all of them are optional. `imc` is derived from
/// weight and height and kept in sync on every upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub client_id: Uuid,

    // Anthropometrics
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub imc: Option<String>,

    // General
    pub reason_for_visit: Option<String>,
    pub current_illness: Option<String>,
    pub family_history: Option<String>,
    pub personal_history: Option<String>,
    pub surgical_history: Option<String>,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub vaccination_status: Option<String>,

    // Lifestyle
    pub smoking: Option<String>,
    pub alcohol: Option<String>,
    pub physical_activity: Option<String>,
    pub diet: Option<String>,
    pub sleep: Option<String>,
    pub occupation: Option<String>,
    pub stress_level: Option<String>,

    // Cardiovascular / respiratory
    pub blood_pressure: Option<String>,
    pub heart_conditions: Option<String>,
    pub circulation_problems: Option<String>,
    pub respiratory_conditions: Option<String>,

    // Musculoskeletal
    pub joint_pain: Option<String>,
    pub muscle_pain: Option<String>,
    pub previous_injuries: Option<String>,
    pub mobility_limitations: Option<String>,
    pub posture_notes: Option<String>,

    // Neurological
    pub headaches: Option<String>,
    pub dizziness: Option<String>,
    pub neurological_conditions: Option<String>,

    // Digestive / metabolic
    pub digestive_issues: Option<String>,
    pub diabetes: Option<String>,
    pub thyroid: Option<String>,
    pub other_metabolic: Option<String>,

    // Dermatological
    pub skin_conditions: Option<String>,

    // Gynecological
    pub pregnancies: Option<String>,
    pub menstrual_history: Option<String>,

    // Psychological
    pub mental_health_history: Option<String>,
    pub current_treatment: Option<String>,

    // Clinical notes
    pub observations: Option<String>,
    pub treatment_plan: Option<String>,

    #[serde(default)]
    pub custom_fields: Vec<CustomField>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Upsert payload: the same shape minus server-managed fields.
pub type UpsertMedicalHistoryRequest = MedicalHistory;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientFollowUp {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub recommendations: Option<String>,
    pub follow_up_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFollowUpRequest {
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub recommendations: Option<String>,
    pub follow_up_type: Option<String>,
}

/// What the transcription endpoint extracts from an audio note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub description: String,
    pub recommendations: Option<String>,
    #[serde(rename = "followUpType")]
    pub follow_up_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceTextRequest {
    pub description: String,
    pub recommendations: Option<String>,
    pub follow_up_type: Option<String>,
    pub client_name: String,
}

/// Computes the BMI string from weight in kg and height in cm, one
/// decimal place. Returns `None` unless both inputs are usable.
pub fn compute_imc(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<String> {
    let weight = weight_kg?;
    let height = height_cm?;
    if weight <= 0.0 || height <= 0.0 {
        return None;
    }
    let height_m = height / 100.0;
    Some(format!("{:.1}", weight / (height_m * height_m)))
}
