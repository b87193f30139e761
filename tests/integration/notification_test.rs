//! Integration tests for the per-user notification inbox.

mod helpers;

use clubhouse_entity::user::UserRole;
use clubhouse_service::attendance::NewAttendanceLog;
use http::StatusCode;
use serde_json::{Value, json};

/// Admin inbox with two pending request notifications.
async fn inbox() -> (helpers::TestApp, helpers::TestUser, helpers::TestUser) {
    let app = helpers::TestApp::new();
    let admin = app
        .user("approver", UserRole::Admin, &["regularization:approve", "notifications:all"])
        .await;
    let requester = app
        .user("asha", UserRole::Staff, &["regularization:create", "notifications:all"])
        .await;

    app.terminal("10.0.0.1");
    app.staff("EMP0042", "Asha Rao").await;
    let root = app.user("root", UserRole::SuperAdmin, &[]).await;
    app.request(
        "POST",
        "/api/biometric/machines",
        Some(json!({ "machine_id": "M1", "name": "Lobby", "ip_address": "10.0.0.1" })),
        Some(&root.token),
    )
    .await;

    let manual = NewAttendanceLog {
        staff_id: Some("EMP0042".to_string()),
        machine_id: Some("M1".to_string()),
        punch_type: Some("check-in".to_string()),
        timestamp: Some("2024-01-15 09:00:00".to_string()),
        ..Default::default()
    };
    let created = app
        .request(
            "POST",
            "/api/biometric/attendance",
            Some(serde_json::to_value(&manual).unwrap()),
            Some(&root.token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let log_id = created.body["data"]["log_id"].clone();

    for reason in ["Clock was fast", "Wrong status"] {
        let filed = app
            .request(
                "POST",
                "/api/biometric/regularization",
                Some(json!({
                    "attendance_log_id": log_id,
                    "request_type": "status_change",
                    "requested_data": { "status": "failed" },
                    "reason": reason,
                })),
                Some(&requester.token),
            )
            .await;
        assert_eq!(filed.status, StatusCode::CREATED, "{:?}", filed.body);
    }
    (app, admin, requester)
}

fn items(response: &helpers::TestResponse) -> Vec<Value> {
    response.body["data"]["items"].as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_inbox_is_scoped_to_the_caller() {
    let (app, admin, requester) = inbox().await;

    let admin_inbox = app
        .request("GET", "/api/biometric/notifications", None, Some(&admin.token))
        .await;
    assert_eq!(admin_inbox.status, StatusCode::OK);
    assert_eq!(admin_inbox.body["data"]["unread_count"], 2);
    assert_eq!(items(&admin_inbox).len(), 2);
    assert!(
        items(&admin_inbox)
            .iter()
            .all(|n| n["notification_type"] == "regularization_request")
    );

    let requester_inbox = app
        .request("GET", "/api/biometric/notifications", None, Some(&requester.token))
        .await;
    assert_eq!(items(&requester_inbox).len(), 0);

    let id = items(&admin_inbox)[0]["id"].as_str().unwrap().to_string();
    let foreign = app
        .request(
            "PUT",
            &format!("/api/biometric/notifications/{id}/read"),
            None,
            Some(&requester.token),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_read_clears_the_notification() {
    let (app, admin, _) = inbox().await;
    let listed = app
        .request("GET", "/api/biometric/notifications", None, Some(&admin.token))
        .await;
    let id = items(&listed)[0]["id"].as_str().unwrap().to_string();

    let read = app
        .request(
            "PUT",
            &format!("/api/biometric/notifications/{id}/read"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(read.status, StatusCode::OK);

    let after = app
        .request("GET", "/api/biometric/notifications", None, Some(&admin.token))
        .await;
    assert_eq!(items(&after).len(), 1);
    assert_eq!(after.body["data"]["unread_count"], 1);
}

#[tokio::test]
async fn test_read_all_keeps_items_listed() {
    let (app, admin, _) = inbox().await;

    let marked = app
        .request("PUT", "/api/biometric/notifications/read-all", None, Some(&admin.token))
        .await;
    assert_eq!(marked.status, StatusCode::OK);
    assert_eq!(marked.body["data"]["count"], 2);

    let count = app
        .request("GET", "/api/biometric/notifications/count", None, Some(&admin.token))
        .await;
    assert_eq!(count.body["data"]["count"], 0);

    let read = app
        .request(
            "GET",
            "/api/biometric/notifications?is_read=true",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(items(&read).len(), 2);

    let again = app
        .request("PUT", "/api/biometric/notifications/read-all", None, Some(&admin.token))
        .await;
    assert_eq!(again.body["data"]["count"], 0);
}

#[tokio::test]
async fn test_delete_notification() {
    let (app, admin, _) = inbox().await;
    let listed = app
        .request("GET", "/api/biometric/notifications", None, Some(&admin.token))
        .await;
    let id = items(&listed)[0]["id"].as_str().unwrap().to_string();

    let deleted = app
        .request(
            "DELETE",
            &format!("/api/biometric/notifications/{id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let twice = app
        .request(
            "DELETE",
            &format!("/api/biometric/notifications/{id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(twice.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inbox_requires_a_token() {
    let app = helpers::TestApp::new();
    let response = app
        .request("GET", "/api/biometric/notifications", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inbox_requires_notification_permissions() {
    let (app, admin, _) = inbox().await;
    let reader = app
        .user("reader", UserRole::Staff, &["notifications:view"])
        .await;
    let outsider = app.user("outsider", UserRole::Manager, &["attendance:view"]).await;

    let denied = app
        .request("GET", "/api/biometric/notifications", None, Some(&outsider.token))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    let denied = app
        .request("GET", "/api/biometric/notifications/count", None, Some(&outsider.token))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let listed = app
        .request("GET", "/api/biometric/notifications", None, Some(&reader.token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let read_all = app
        .request("PUT", "/api/biometric/notifications/read-all", None, Some(&reader.token))
        .await;
    assert_eq!(read_all.status, StatusCode::FORBIDDEN);

    let inbox = app
        .request("GET", "/api/biometric/notifications", None, Some(&admin.token))
        .await;
    let id = items(&inbox)[0]["id"].as_str().unwrap().to_string();
    let delete = app
        .request(
            "DELETE",
            &format!("/api/biometric/notifications/{id}"),
            None,
            Some(&reader.token),
        )
        .await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
}
