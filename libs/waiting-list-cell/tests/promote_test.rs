use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path};

use waiting_list_cell::models::PromoteRequest;
use waiting_list_cell::services::WaitingListService;
use shared_utils::test_utils::TestConfig;

fn entry_row(entry_id: Uuid, organization_id: Uuid, client_id: Uuid) -> serde_json::Value {
    json!({
        "id": entry_id,
        "organization_id": organization_id,
        "client_id": client_id,
        "preferred_user_id": null,
        "preferred_service_id": null,
        "date_from": null,
        "date_to": null,
        "time_preference": "any",
        "notes": "prefers mornings",
        "created_at": "2026-02-01T09:00:00Z",
        "updated_at": "2026-02-01T09:00:00Z"
    })
}

fn promote_request(user_id: Uuid) -> PromoteRequest {
    PromoteRequest {
        user_id,
        service_id: None,
        consultation_id: None,
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: None,
        duration_minutes: Some(45),
    }
}

async fn mount_schedulability_mocks(mock_server: &MockServer) {
    // No configured schedules: the default 08:00-18:00 window applies,
    // so a 10:00 slot is schedulable.
    Mock::given(method("GET"))
        .and(path("/rest/v1/work_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/absences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_promote_creates_appointment_and_removes_entry() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let entry_id = Uuid::new_v4();
    let organization_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let token = "test-token";

    Mock::given(method("GET"))
        .and(path("/rest/v1/waiting_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            entry_row(entry_id, organization_id, client_id)
        ])))
        .mount(&mock_server)
        .await;

    mount_schedulability_mocks(&mock_server).await;

    // No existing bookings to conflict with
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": appointment_id,
            "organization_id": organization_id,
            "client_id": client_id,
            "user_id": user_id,
            "consultation_id": null,
            "service_id": null,
            "date": "2026-03-02",
            "start_time": "10:00:00",
            "end_time": "10:45:00",
            "duration_minutes": 45,
            "status": "pending",
            "notes": "prefers mornings",
            "diagnosis": null,
            "created_at": "2026-03-01T12:00:00Z",
            "updated_at": "2026-03-01T12:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/waiting_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = WaitingListService::new(&config);
    let appointment = service
        .promote_entry(&entry_id.to_string(), promote_request(user_id), token)
        .await
        .unwrap();

    assert_eq!(appointment.id, appointment_id);
    assert_eq!(appointment.client_id, client_id);
    assert_eq!(appointment.duration_minutes, 45);
}

/// Promotion is two separate writes with no rollback: when the entry
/// delete fails, the appointment still exists. The error tells the
/// caller to clean up by hand.
#[tokio::test]
async fn test_failed_delete_leaves_appointment_behind() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let entry_id = Uuid::new_v4();
    let organization_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let token = "test-token";

    Mock::given(method("GET"))
        .and(path("/rest/v1/waiting_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            entry_row(entry_id, organization_id, client_id)
        ])))
        .mount(&mock_server)
        .await;

    mount_schedulability_mocks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "organization_id": organization_id,
            "client_id": client_id,
            "user_id": user_id,
            "consultation_id": null,
            "service_id": null,
            "date": "2026-03-02",
            "start_time": "10:00:00",
            "end_time": "10:45:00",
            "duration_minutes": 45,
            "status": "pending",
            "notes": "prefers mornings",
            "diagnosis": null,
            "created_at": "2026-03-01T12:00:00Z",
            "updated_at": "2026-03-01T12:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/waiting_list"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "storage error"
        })))
        .mount(&mock_server)
        .await;

    let service = WaitingListService::new(&config);
    let result = service
        .promote_entry(&entry_id.to_string(), promote_request(user_id), token)
        .await;

    // The appointment insert went through even though promote failed.
    assert!(result.is_err());
    let posted = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/rest/v1/appointments")
        .count();
    assert_eq!(posted, 1);
}
