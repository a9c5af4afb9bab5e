use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path};

use billing_cell::models::{CreateInvoiceRequest, InvoiceLine};
use billing_cell::services::InvoiceService;
use shared_utils::test_utils::TestConfig;

fn line(description: &str, price: f64, vat: f64) -> InvoiceLine {
    InvoiceLine {
        description: description.to_string(),
        quantity: 1.0,
        unit_price: price,
        discount_percent: 0.0,
        vat_percent: vat,
        irpf_percent: 0.0,
        retention_percent: 0.0,
    }
}

async fn mount_creation_mocks(mock_server: &MockServer, invoice_id: Uuid, organization_id: Uuid, client_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "invoice_counter": 7 }
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/invoices"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": invoice_id,
            "organization_id": organization_id,
            "client_id": client_id,
            "appointment_id": null,
            "invoice_number": "2026-0007",
            "issue_date": "2026-08-29",
            "base_amount": 140.0,
            "vat_amount": 25.2,
            "irpf_amount": 0.0,
            "retention_amount": 0.0,
            "discount_amount": 0.0,
            "total": 165.2,
            "pdf_url": null,
            "created_at": "2026-08-29T10:00:00Z",
            "updated_at": "2026-08-29T10:00:00Z"
        }])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "first_name": "Ana",
            "last_name": "García",
            "tax_id": null,
            "address": null,
            "postal_code": null,
            "city": null,
            "province": null
        }])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_lines_are_inserted_into_their_own_table() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let invoice_id = Uuid::new_v4();
    let organization_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    mount_creation_mocks(&mock_server, invoice_id, organization_id, client_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/invoice_lines"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = InvoiceService::new(&config);
    let invoice = service
        .create_invoice(
            CreateInvoiceRequest {
                organization_id,
                client_id,
                appointment_id: None,
                issue_date: None,
                lines: vec![line("First session", 80.0, 21.0), line("Follow-up", 60.0, 21.0)],
            },
            "test-token",
        )
        .await
        .unwrap();

    assert_eq!(invoice.lines.len(), 2);

    // One batch insert, one row per line, each pointing at the invoice.
    let requests = mock_server.received_requests().await.unwrap();
    let bodies: Vec<serde_json::Value> = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/rest/v1/invoice_lines")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();

    assert_eq!(bodies.len(), 1);
    let rows = bodies[0].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["invoice_id"], invoice_id.to_string());
    assert_eq!(rows[0]["description"], "First session");
    assert_eq!(rows[1]["invoice_id"], invoice_id.to_string());
    assert_eq!(rows[1]["unit_price"], 60.0);
}

/// Line persistence is a second request with no rollback: when it fails,
/// the invoice row already exists and the error says so.
#[tokio::test]
async fn test_failed_line_insert_leaves_invoice_row_behind() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let invoice_id = Uuid::new_v4();
    let organization_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    mount_creation_mocks(&mock_server, invoice_id, organization_id, client_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/invoice_lines"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "storage error"
        })))
        .mount(&mock_server)
        .await;

    let service = InvoiceService::new(&config);
    let result = service
        .create_invoice(
            CreateInvoiceRequest {
                organization_id,
                client_id,
                appointment_id: None,
                issue_date: None,
                lines: vec![line("Session", 60.0, 21.0)],
            },
            "test-token",
        )
        .await;

    assert!(result.is_err());
    let posted_invoices = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/rest/v1/invoices")
        .count();
    assert_eq!(posted_invoices, 1);
}
