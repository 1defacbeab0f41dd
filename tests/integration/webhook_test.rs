//! Integration tests for webhook subscriptions and delivery.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wagate_entity::message::{Chat, MessageRecord, MessageType};
use wagate_service::ProtocolEvent;

use crate::helpers::{TestApp, WID, wait_for_requests};

#[tokio::test]
async fn test_webhook_crud() {
    let app = TestApp::with_tenant("tok").await;
    let url = "http://localhost:9/hook";

    let response = app
        .request("POST", "/api/tok/webhooks", Some(json!({ "url": url })), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/api/tok/webhooks/toggle",
            Some(json!({ "url": url, "option": "groups" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["value"], "true");

    let response = app.request("GET", "/api/tok/webhooks", None, None).await;
    let hooks = response.body["data"].as_array().unwrap();
    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks[0]["groups"], true);

    let delete = format!("/api/tok/webhooks?url={url}");
    let response = app.request("DELETE", &delete, None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    let response = app.request("DELETE", &delete, None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_rejects_invalid_input() {
    let app = TestApp::with_tenant("tok").await;

    let response = app
        .request(
            "POST",
            "/api/tok/webhooks",
            Some(json!({ "url": "ftp://example.com" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/tok/webhooks/toggle",
            Some(json!({ "url": "http://localhost:9/missing", "option": "groups" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "POST",
            "/api/tok/webhooks/toggle",
            Some(json!({ "url": "http://localhost:9/missing", "option": "colors" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inbound_message_reaches_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("X-WAGATE-WID", WID))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = TestApp::with_tenant("tok").await;
    let url = format!("{}/hook", server.uri());
    let response = app
        .request(
            "POST",
            "/api/webhooks",
            Some(json!({ "url": url, "extra": { "tenant": 7 } })),
            Some("tok"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let mut record = MessageRecord::new(
        "MSG1",
        Chat::new("5511888880000@s.whatsapp.net"),
        MessageType::Text,
        Utc::now(),
    );
    record.text = "hi".to_string();
    app.connection("tok").inject(ProtocolEvent::NewMessage(record));

    let received = wait_for_requests(&server, 1).await;
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["message"]["id"], "MSG1");
    assert_eq!(body["message"]["text"], "hi");
    assert_eq!(body["extra"]["tenant"], 7);

    let response = app.request("GET", "/api/tok/message/msg1", None, None).await;
    assert_eq!(response.body["data"]["text"], "hi");
}

#[tokio::test]
async fn test_internal_message_forwarded_to_other_system() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = TestApp::with_tenant("tok").await;
    let response = app
        .request(
            "POST",
            "/api/tok/webhooks",
            Some(json!({ "url": format!("{}/erp", server.uri()), "trackid": "erp" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/api/tok/send",
            Some(json!({ "chatid": "5511888880000", "text": "from crm", "trackid": "crm" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let received = wait_for_requests(&server, 1).await;
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["message"]["trackid"], "crm");
    assert_eq!(body["message"]["frominternal"], true);
}
