//! Integration tests for the regularization approval workflow.

mod helpers;

use chrono::NaiveDate;
use clubhouse_device::{DeviceEndpoint, DeviceRecord};
use clubhouse_entity::user::UserRole;
use http::StatusCode;
use serde_json::json;

const REQUESTER_GRANTS: &[&str] = &[
    "regularization:create",
    "regularization:view",
    "notifications:all",
];
const APPROVER_GRANTS: &[&str] = &[
    "regularization:approve",
    "regularization:view",
    "notifications:all",
];

struct Scene {
    app: helpers::TestApp,
    root: helpers::TestUser,
    admin: helpers::TestUser,
    requester: helpers::TestUser,
    log_id: String,
}

/// One synced 09:00 punch for EMP0042, a staff requester and an admin approver.
async fn scene() -> Scene {
    let app = helpers::TestApp::new();
    let root = app.user("root", UserRole::SuperAdmin, &[]).await;
    let admin = app.user("approver", UserRole::Admin, APPROVER_GRANTS).await;
    let requester = app.user("asha", UserRole::Staff, REQUESTER_GRANTS).await;

    app.machine(&root.token, "M1", "10.0.0.1").await;
    app.staff("EMP0042", "Asha Rao").await;
    let assigned = app
        .request(
            "POST",
            "/api/biometric/staff/assign",
            Some(json!({ "staff_id": "EMP0042", "machine_id": "M1" })),
            Some(&root.token),
        )
        .await;
    assert_eq!(assigned.status, StatusCode::OK);

    app.mock.push_punch(
        &DeviceEndpoint::new("10.0.0.1", 4370),
        DeviceRecord {
            user_sn: 1,
            device_user_id: "42".to_string(),
            record_time: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            record_type: 0,
            verify_mode: 1,
        },
    );
    app.request("POST", "/api/biometric/attendance/sync/M1", None, Some(&root.token))
        .await;
    let logs = app
        .request("GET", "/api/biometric/attendance", None, Some(&root.token))
        .await;
    let log_id = logs.body["data"]["items"][0]["log_id"]
        .as_str()
        .unwrap()
        .to_string();

    Scene {
        app,
        root,
        admin,
        requester,
        log_id,
    }
}

impl Scene {
    async fn file_time_change(&self, token: &str) -> helpers::TestResponse {
        self.app
            .request(
                "POST",
                "/api/biometric/regularization",
                Some(json!({
                    "attendance_log_id": self.log_id,
                    "request_type": "time_change",
                    "original_data": { "timestamp": "2024-01-15 09:00:00" },
                    "requested_data": { "timestamp": "2024-01-15 09:05:00" },
                    "reason": "Terminal clock was fast",
                })),
                Some(token),
            )
            .await
    }

    async fn unread(&self, token: &str) -> u64 {
        let response = self
            .app
            .request("GET", "/api/biometric/notifications/count", None, Some(token))
            .await;
        response.body["data"]["count"].as_u64().unwrap()
    }
}

#[tokio::test]
async fn test_request_approve_and_double_approve() {
    let s = scene().await;

    let created = s.file_time_change(&s.requester.token).await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["data"]["request"]["status"], "pending");
    assert!(created.body["data"]["applied"].is_null());
    let id = created.body["data"]["request"]["id"].as_str().unwrap().to_string();

    assert_eq!(s.unread(&s.admin.token).await, 1);
    assert_eq!(s.unread(&s.root.token).await, 1);
    assert_eq!(s.unread(&s.requester.token).await, 0);

    let approved = s
        .app
        .request(
            "PUT",
            &format!("/api/biometric/regularization/{id}/approve"),
            None,
            Some(&s.admin.token),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK, "{:?}", approved.body);
    assert_eq!(approved.body["data"]["request"]["status"], "approved");
    assert_eq!(approved.body["data"]["applied"], true);
    assert_eq!(
        approved.body["data"]["attendance_log"]["timestamp"],
        "2024-01-15T09:05:00Z"
    );

    let again = s
        .app
        .request(
            "PUT",
            &format!("/api/biometric/regularization/{id}/approve"),
            None,
            Some(&s.root.token),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "ALREADY_PROCESSED");

    assert_eq!(s.unread(&s.admin.token).await, 0);
    assert_eq!(s.unread(&s.root.token).await, 0);

    let inbox = s
        .app
        .request("GET", "/api/biometric/notifications", None, Some(&s.requester.token))
        .await;
    assert_eq!(inbox.body["data"]["total_items"], 1);
    assert_eq!(
        inbox.body["data"]["items"][0]["notification_type"],
        "regularization_approved"
    );
}

#[tokio::test]
async fn test_reject_with_reason_leaves_log_untouched() {
    let s = scene().await;
    let created = s.file_time_change(&s.requester.token).await;
    let id = created.body["data"]["request"]["id"].as_str().unwrap().to_string();

    let rejected = s
        .app
        .request(
            "PUT",
            &format!("/api/biometric/regularization/{id}/reject"),
            Some(json!({ "approval_reason": "Clock was checked" })),
            Some(&s.admin.token),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::OK, "{:?}", rejected.body);
    assert_eq!(rejected.body["data"]["request"]["status"], "rejected");
    assert_eq!(
        rejected.body["data"]["request"]["approval_reason"],
        "Clock was checked"
    );

    let logs = s
        .app
        .request("GET", "/api/biometric/attendance", None, Some(&s.root.token))
        .await;
    assert_eq!(
        logs.body["data"]["items"][0]["timestamp"],
        "2024-01-15T09:00:00Z"
    );

    let inbox = s
        .app
        .request("GET", "/api/biometric/notifications", None, Some(&s.requester.token))
        .await;
    assert_eq!(
        inbox.body["data"]["items"][0]["notification_type"],
        "regularization_rejected"
    );
}

#[tokio::test]
async fn test_superadmin_request_is_auto_approved() {
    let s = scene().await;

    let created = s.file_time_change(&s.root.token).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["request"]["status"], "approved");
    assert_eq!(
        created.body["data"]["request"]["approval_reason"],
        "Auto-approved by superadmin"
    );
    assert_eq!(created.body["data"]["applied"], true);
    assert_eq!(s.unread(&s.admin.token).await, 0);
}

#[tokio::test]
async fn test_approval_requires_permission() {
    let s = scene().await;
    let created = s.file_time_change(&s.requester.token).await;
    let id = created.body["data"]["request"]["id"].as_str().unwrap().to_string();

    let response = s
        .app
        .request(
            "PUT",
            &format!("/api/biometric/regularization/{id}/approve"),
            None,
            Some(&s.requester.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let s = scene().await;

    let missing_field = s
        .app
        .request(
            "POST",
            "/api/biometric/regularization",
            Some(json!({
                "attendance_log_id": s.log_id,
                "request_type": "status_change",
                "requested_data": {},
                "reason": "Wrong status",
            })),
            Some(&s.requester.token),
        )
        .await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);

    let unknown_log = s
        .app
        .request(
            "POST",
            "/api/biometric/regularization",
            Some(json!({
                "attendance_log_id": uuid::Uuid::new_v4(),
                "request_type": "delete_log",
                "requested_data": {},
                "reason": "Duplicate punch",
            })),
            Some(&s.requester.token),
        )
        .await;
    assert_eq!(unknown_log.status, StatusCode::NOT_FOUND);

    let unknown_request = s
        .app
        .request(
            "PUT",
            &format!("/api/biometric/regularization/{}/approve", uuid::Uuid::new_v4()),
            None,
            Some(&s.admin.token),
        )
        .await;
    assert_eq!(unknown_request.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_and_history() {
    let s = scene().await;
    s.file_time_change(&s.requester.token).await;
    let other = s
        .app
        .user("other", UserRole::Staff, REQUESTER_GRANTS)
        .await;
    s.file_time_change(&other.token).await;

    let own = s
        .app
        .request("GET", "/api/biometric/regularization", None, Some(&s.requester.token))
        .await;
    assert_eq!(own.body["data"]["total_items"], 1);

    let all = s
        .app
        .request(
            "GET",
            "/api/biometric/regularization?status=pending",
            None,
            Some(&s.admin.token),
        )
        .await;
    assert_eq!(all.body["data"]["total_items"], 2);

    let history = s
        .app
        .request(
            "GET",
            &format!("/api/biometric/regularization/history/{}", s.log_id),
            None,
            Some(&s.admin.token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body["data"].as_array().unwrap().len(), 2);
}
