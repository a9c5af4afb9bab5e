use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header_regex};

use medical_history_cell::models::MedicalHistory;
use medical_history_cell::services::HistoryService;
use shared_utils::test_utils::TestConfig;

#[tokio::test]
async fn test_upsert_recomputes_bmi_before_persisting() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let client_id = Uuid::new_v4();
    let token = "test-token";

    Mock::given(method("POST"))
        .and(path("/rest/v1/medical_histories"))
        .and(header_regex("Prefer", "merge-duplicates"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "client_id": client_id,
            "weight_kg": 70.0,
            "height_cm": 170.0,
            "imc": "24.2"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = MedicalHistory {
        weight_kg: Some(70.0),
        height_cm: Some(170.0),
        imc: Some("19.0".to_string()),
        ..Default::default()
    };

    let service = HistoryService::new(&config);
    let history = service
        .upsert_history(&client_id.to_string(), request, token)
        .await
        .unwrap();

    assert_eq!(history.imc.as_deref(), Some("24.2"));

    // The stale client-provided value was replaced in the stored payload,
    // and the write went out as a merge-duplicates upsert.
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("Prefer").and_then(|v| v.to_str().ok()),
        Some("resolution=merge-duplicates,return=representation")
    );
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["imc"], "24.2");
    assert_eq!(body["client_id"], client_id.to_string());
}

#[tokio::test]
async fn test_missing_history_reads_as_none() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_histories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = HistoryService::new(&config);
    let history = service
        .get_history(&Uuid::new_v4().to_string(), "test-token")
        .await
        .unwrap();

    assert!(history.is_none());
}
