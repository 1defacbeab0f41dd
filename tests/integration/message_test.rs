//! Integration tests for message endpoints.

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use serde_json::json;

use wagate_database::TenantRepository;
use wagate_entity::message::{Chat, MessageRecord, MessageType};
use wagate_entity::tenant::TenantConfig;
use wagate_service::ProtocolEvent;

use crate::helpers::TestApp;

fn inbound(id: &str, text: &str, secs: i64) -> MessageRecord {
    let timestamp = Utc.timestamp_opt(secs, 0).single().expect("valid timestamp");
    let mut record = MessageRecord::new(
        id,
        Chat::new("5511888880000@s.whatsapp.net"),
        MessageType::Text,
        timestamp,
    );
    record.text = text.to_string();
    record
}

#[tokio::test]
async fn test_send_returns_assigned_id() {
    let app = TestApp::with_tenant("tok").await;

    let response = app
        .request(
            "POST",
            "/api/tok/send",
            Some(json!({ "chatid": "+5511888880000", "text": "hello", "trackid": "crm-1" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["chatid"], "5511888880000@s.whatsapp.net");
    assert_eq!(response.body["data"]["trackid"], "crm-1");

    let id = response.body["data"]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("3EB0"));
    assert_eq!(app.connection("tok").sent().len(), 1);

    let path = format!("/api/tok/message/{}", id.to_lowercase());
    let response = app.request("GET", &path, None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], id.as_str());
    assert_eq!(response.body["data"]["frominternal"], true);
    assert_eq!(response.body["data"]["fromme"], true);
}

#[tokio::test]
async fn test_send_validation() {
    let app = TestApp::with_tenant("tok").await;

    let response = app
        .request("POST", "/api/tok/send", Some(json!({ "text": "hello" })), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/tok/send",
            Some(json!({ "chatid": "5511888880000" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.connection("tok").sent().is_empty());
}

#[tokio::test]
async fn test_send_requires_ready_tenant() {
    let app = TestApp::new().await;
    app.repository
        .save(&TenantConfig::new("fresh"))
        .await
        .unwrap();
    app.registry.initialize().await.unwrap();

    let response = app
        .request(
            "POST",
            "/api/fresh/send",
            Some(json!({ "chatid": "5511888880000", "text": "hello" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_receive_orders_and_filters_by_timestamp() {
    let app = TestApp::with_tenant("tok").await;
    let connection = app.connection("tok");
    connection.inject(ProtocolEvent::NewMessage(inbound("B", "second", 2_000)));
    connection.inject(ProtocolEvent::NewMessage(inbound("A", "first", 1_000)));

    let runtime = app.registry.get("tok").unwrap();
    app.eventually(|| runtime.cache().count() == 2).await;

    let response = app.request("GET", "/api/tok/receive", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["A", "B"]);

    let response = app
        .request("GET", "/api/tok/receive?timestamp=1500", None, None)
        .await;
    let data = response.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["text"], "second");
}

#[tokio::test]
async fn test_unknown_message_is_empty_success() {
    let app = TestApp::with_tenant("tok").await;
    let response = app.request("GET", "/api/tok/message/NOPE", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"].is_null());
}

#[tokio::test]
async fn test_revoke_by_prefix() {
    let app = TestApp::with_tenant("tok").await;
    let connection = app.connection("tok");
    connection.inject(ProtocolEvent::NewMessage(inbound("ABC1", "one", 1_000)));
    connection.inject(ProtocolEvent::NewMessage(inbound("ABC2", "two", 1_001)));
    connection.inject(ProtocolEvent::NewMessage(inbound("XYZ", "three", 1_002)));

    let runtime = app.registry.get("tok").unwrap();
    app.eventually(|| runtime.cache().count() == 3).await;

    let response = app
        .request("DELETE", "/api/tok/message/abc?prefix=true", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["revoked"].as_array().unwrap().len(), 2);

    let mut revoked = connection.revoked();
    revoked.sort();
    assert_eq!(revoked, vec!["ABC1".to_string(), "ABC2".to_string()]);
}
