//! Integration tests for tenant lifecycle endpoints.

use axum::http::StatusCode;
use serde_json::json;

use wagate_database::TenantRepository;
use wagate_entity::tenant::TenantConfig;

use crate::helpers::{TestApp, WID};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");

    let response = app.request("GET", "/health/detailed", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["database"], "connected");
    assert_eq!(response.body["data"]["tenants"], 0);
}

#[tokio::test]
async fn test_unknown_tenant_is_not_found() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/nobody/info", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/info", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pair_then_info() {
    let app = TestApp::new().await;
    let response = app
        .request("POST", "/api/tok/pair", Some(json!({ "wid": WID })), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ready");

    let response = app.request("GET", "/api/info", None, Some("tok")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["wid"], WID);
    assert_eq!(response.body["data"]["groups"], true);
    assert_eq!(response.body["data"]["broadcasts"], false);
}

#[tokio::test]
async fn test_pair_validation_and_conflict() {
    let app = TestApp::with_tenant("first").await;

    let response = app
        .request("POST", "/api/second/pair", Some(json!({ "wid": "" })), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("POST", "/api/second/pair", Some(json!({ "wid": WID })), None)
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_tenant() {
    let app = TestApp::with_tenant("tok").await;

    let response = app.request("DELETE", "/api/tok", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!app.registry.exists("tok"));

    let response = app.request("DELETE", "/api/tok", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logged_out_tenant_is_loaded_but_not_started() {
    let app = TestApp::new().await;
    let mut config = TenantConfig::new("gone");
    config.wid = Some(WID.to_string());
    config.verified = false;
    app.repository.save(&config).await.unwrap();
    app.registry.initialize().await.unwrap();

    let response = app.request("GET", "/api/gone/info", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "loggedout");
    assert!(app.factory.connection("gone").is_none());
}
