//! Integration tests for machine management and request authentication.

mod helpers;

use clubhouse_entity::user::UserRole;
use http::StatusCode;

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = helpers::TestApp::new();

    let response = app
        .request("GET", "/api/biometric/machines", None, None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "AUTHENTICATION");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = helpers::TestApp::new();

    let response = app
        .request("GET", "/api/biometric/machines", None, Some("not-a-jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let app = helpers::TestApp::new();
    let viewer = app
        .user("viewer", UserRole::Staff, &["machines:view"])
        .await;

    let listed = app
        .request("GET", "/api/biometric/machines", None, Some(&viewer.token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);

    let created = app
        .request(
            "POST",
            "/api/biometric/machines",
            Some(serde_json::json!({
                "machine_id": "M1",
                "name": "Lobby",
                "ip_address": "10.0.0.1",
            })),
            Some(&viewer.token),
        )
        .await;
    assert_eq!(created.status, StatusCode::FORBIDDEN);
    assert_eq!(created.body["error"], "AUTHORIZATION");
}

#[tokio::test]
async fn test_module_wide_grant_covers_every_action() {
    let app = helpers::TestApp::new();
    let operator = app
        .user("operator", UserRole::Manager, &["machines:all"])
        .await;

    let machine = app.machine(&operator.token, "M1", "10.0.0.1").await;
    assert_eq!(machine["machine_id"], "M1");
    assert_eq!(machine["port"], 4370);
}

#[tokio::test]
async fn test_machine_lifecycle() {
    let app = helpers::TestApp::new();
    let admin = app.user("root", UserRole::SuperAdmin, &[]).await;

    let machine = app.machine(&admin.token, "M1", "10.0.0.1").await;
    let id = machine["id"].as_str().unwrap().to_string();

    let probe = app
        .request(
            "GET",
            &format!("/api/biometric/machines/{id}/test-connection"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(probe.status, StatusCode::OK);
    assert_eq!(probe.body["data"]["status"], "online");

    let detail = app
        .request(
            "GET",
            &format!("/api/biometric/machines/{id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["status"], "online");
    assert_eq!(detail.body["data"]["authoritative_logs"], 0);

    let updated = app
        .request(
            "PUT",
            &format!("/api/biometric/machines/{id}"),
            Some(serde_json::json!({ "name": "Pool entrance" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["name"], "Pool entrance");
    assert_eq!(updated.body["data"]["ip_address"], "10.0.0.1");

    let deleted = app
        .request(
            "DELETE",
            &format!("/api/biometric/machines/{id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let active = app
        .request("GET", "/api/biometric/machines", None, Some(&admin.token))
        .await;
    assert_eq!(active.body["data"].as_array().unwrap().len(), 0);

    let all = app
        .request(
            "GET",
            "/api/biometric/machines?include_inactive=true",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(all.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(all.body["data"][0]["is_active"], false);
}

#[tokio::test]
async fn test_duplicate_machine_id_conflicts() {
    let app = helpers::TestApp::new();
    let admin = app.user("root", UserRole::SuperAdmin, &[]).await;
    app.machine(&admin.token, "M1", "10.0.0.1").await;

    let again = app
        .request(
            "POST",
            "/api/biometric/machines",
            Some(serde_json::json!({
                "machine_id": "M1",
                "name": "Second",
                "ip_address": "10.0.0.2",
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_body_is_a_validation_error() {
    let app = helpers::TestApp::new();
    let admin = app.user("root", UserRole::SuperAdmin, &[]).await;

    let response = app
        .request(
            "POST",
            "/api/biometric/machines",
            Some(serde_json::json!({
                "machine_id": "M1",
                "name": "",
                "ip_address": "10.0.0.1",
            })),
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .contains("name is required")
    );
}

#[tokio::test]
async fn test_unknown_machine_is_not_found() {
    let app = helpers::TestApp::new();
    let admin = app.user("root", UserRole::SuperAdmin, &[]).await;

    let response = app
        .request(
            "GET",
            &format!("/api/biometric/machines/{}", uuid::Uuid::new_v4()),
            None,
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_scan_finds_terminals() {
    let app = helpers::TestApp::new();
    let admin = app.user("root", UserRole::SuperAdmin, &[]).await;
    app.terminal("10.0.0.7");

    let response = app
        .request(
            "GET",
            "/api/biometric/machines/scan?prefix=10.0.0&start=1&end=10",
            None,
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let hits = response.body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["endpoint"]["ip"], "10.0.0.7");
}
