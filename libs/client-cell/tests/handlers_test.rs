use std::sync::Arc;
use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, query_param};

use client_cell::handlers::{create_client, search_clients, ListClientsQuery, SearchClientsQuery};
use client_cell::handlers::list_clients;
use client_cell::models::CreateClientRequest;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

fn create_auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    let auth = Authorization::bearer(token).unwrap();
    TypedHeader(auth)
}

fn client_row(id: Uuid, organization_id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "organization_id": organization_id,
        "first_name": "Maria",
        "last_name": "Garcia",
        "email": "maria@example.com",
        "phone": "612345678",
        "tax_id": null,
        "address": null,
        "postal_code": null,
        "city": null,
        "province": null,
        "date_of_birth": null,
        "gender": null,
        "notes": null,
        "created_at": "2026-01-10T09:00:00Z",
        "updated_at": "2026-01-10T09:00:00Z"
    })
}

#[tokio::test]
async fn test_create_client_success() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let user = TestUser::receptionist("front@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let organization_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/clients"))
        .and(header("Authorization", format!("Bearer {}", token)))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            client_row(client_id, organization_id)
        ])))
        .mount(&mock_server)
        .await;

    let request = CreateClientRequest {
        organization_id,
        first_name: "Maria".to_string(),
        last_name: "Garcia".to_string(),
        email: Some("maria@example.com".to_string()),
        phone: Some("612345678".to_string()),
        tax_id: None,
        address: None,
        postal_code: None,
        city: None,
        province: None,
        date_of_birth: None,
        gender: None,
        notes: None,
    };

    let result = create_client(
        State(Arc::new(config)),
        create_auth_header(&token),
        Json(request),
    ).await;

    assert!(result.is_ok());
    let response = result.unwrap().0;
    assert_eq!(response["id"], client_id.to_string());
    assert_eq!(response["first_name"], "Maria");
}

#[tokio::test]
async fn test_create_client_rejects_bad_phone() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let user = TestUser::receptionist("front@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let request = CreateClientRequest {
        organization_id: Uuid::new_v4(),
        first_name: "Maria".to_string(),
        last_name: "Garcia".to_string(),
        email: None,
        phone: Some("612".to_string()),
        tax_id: None,
        address: None,
        postal_code: None,
        city: None,
        province: None,
        date_of_birth: None,
        gender: None,
        notes: None,
    };

    let result = create_client(
        State(Arc::new(config)),
        create_auth_header(&token),
        Json(request),
    ).await;

    assert!(result.is_err());
    // Nothing reached the datastore
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_digit_search_queries_phones_only() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let user = TestUser::receptionist("front@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let organization_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("phone", "ilike.*612*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            client_row(Uuid::new_v4(), organization_id)
        ])))
        .mount(&mock_server)
        .await;

    let result = search_clients(
        State(Arc::new(config)),
        create_auth_header(&token),
        Query(SearchClientsQuery {
            organization_id: organization_id.to_string(),
            q: "612".to_string(),
        }),
    ).await;

    assert!(result.is_ok());
    let response = result.unwrap().0;
    assert_eq!(response["total"], 1);
    assert_eq!(response["results"][0]["matched_by"], "phone");

    // A purely numeric query must not trigger a name search, so exactly
    // one datastore request went out.
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_text_search_tags_name_matches() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let user = TestUser::receptionist("front@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let organization_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            client_row(Uuid::new_v4(), organization_id)
        ])))
        .mount(&mock_server)
        .await;

    let result = search_clients(
        State(Arc::new(config)),
        create_auth_header(&token),
        Query(SearchClientsQuery {
            organization_id: organization_id.to_string(),
            q: "Maria".to_string(),
        }),
    ).await;

    assert!(result.is_ok());
    let response = result.unwrap().0;
    assert_eq!(response["results"][0]["matched_by"], "name");
}

#[tokio::test]
async fn test_list_clients_returns_page() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let user = TestUser::receptionist("front@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let organization_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("organization_id", format!("eq.{}", organization_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            client_row(Uuid::new_v4(), organization_id),
            client_row(Uuid::new_v4(), organization_id)
        ])))
        .mount(&mock_server)
        .await;

    let result = list_clients(
        State(Arc::new(config)),
        create_auth_header(&token),
        Query(ListClientsQuery {
            organization_id: organization_id.to_string(),
            limit: None,
            offset: None,
        }),
    ).await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap().0["total"], 2);
}
