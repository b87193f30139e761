//! Integration tests for attendance sync, import and queries.

mod helpers;

use chrono::NaiveDate;
use clubhouse_device::DeviceRecord;
use clubhouse_entity::user::UserRole;
use http::StatusCode;

/// App with machine M1 and EMP0042 enrolled on it as device user 42.
async fn enrolled_app() -> (helpers::TestApp, helpers::TestUser) {
    let app = helpers::TestApp::new();
    let admin = app.user("root", UserRole::SuperAdmin, &[]).await;
    app.machine(&admin.token, "M1", "10.0.0.1").await;
    app.staff("EMP0042", "Asha Rao").await;

    let assigned = app
        .request(
            "POST",
            "/api/biometric/staff/assign",
            Some(serde_json::json!({ "staff_id": "EMP0042", "machine_id": "M1" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(assigned.status, StatusCode::OK, "{:?}", assigned.body);
    assert_eq!(assigned.body["data"]["device_user_id"], "42");
    (app, admin)
}

fn record(user_sn: u16, device_user_id: &str, hour: u32) -> DeviceRecord {
    DeviceRecord {
        user_sn,
        device_user_id: device_user_id.to_string(),
        record_time: NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap(),
        record_type: 1,
        verify_mode: 1,
    }
}

#[tokio::test]
async fn test_assignment_provisions_the_terminal() {
    let (app, _) = enrolled_app().await;
    let users = app.mock.users(&clubhouse_device::DeviceEndpoint::new("10.0.0.1", 4370));
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user_id, "42");
    assert_eq!(users[0].name, "Asha Rao");
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let (app, admin) = enrolled_app().await;
    let endpoint = clubhouse_device::DeviceEndpoint::new("10.0.0.1", 4370);
    app.mock.push_punch(&endpoint, record(1, "42", 9));
    app.mock.push_punch(&endpoint, record(2, "99", 10));

    let first = app
        .request("POST", "/api/biometric/attendance/sync/M1", None, Some(&admin.token))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"]["synced_count"], 1);
    assert_eq!(first.body["data"]["skipped_count"], 1);
    assert!(first.body["data"]["user_mapping"]["99"].is_null());

    let second = app
        .request("POST", "/api/biometric/attendance/sync/M1", None, Some(&admin.token))
        .await;
    assert_eq!(second.body["data"]["synced_count"], 0);
    assert_eq!(second.body["data"]["duplicate_count"], 1);
}

#[tokio::test]
async fn test_sync_of_unreachable_machine_is_service_unavailable() {
    let (app, admin) = enrolled_app().await;
    app.mock
        .set_reachable(&clubhouse_device::DeviceEndpoint::new("10.0.0.1", 4370), false);

    let response = app
        .request("POST", "/api/biometric/attendance/sync/M1", None, Some(&admin.token))
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "DEVICE_UNREACHABLE");
}

#[tokio::test]
async fn test_csv_upload_reports_every_row() {
    let (app, admin) = enrolled_app().await;
    let csv = "deviceUserId,userSn,recordTime,recordType,verifyMode\n\
               42,1,2024-01-15 09:00:00,1,1\n\
               42,1,2024-01-15 09:00:00,1,1\n\
               77,2,2024-01-15 09:10:00,1,1\n\
               42,3,yesterday,2,1\n";

    let response = app
        .upload(
            "/api/biometric/attendance/import",
            "M1",
            "export.csv",
            csv,
            &admin.token,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let report = &response.body["data"];
    assert_eq!(report["format"], "csv");
    assert_eq!(report["total_rows"], 4);
    assert_eq!(report["imported_count"], 1);
    assert_eq!(report["duplicate_count"], 1);
    assert_eq!(report["unmapped_count"], 1);
    assert_eq!(report["error_count"], 1);
    assert_eq!(report["unmapped_users"][0], "77");
    assert_eq!(report["import_details"][0]["status"], "success");
    assert_eq!(report["import_details"][3]["status"], "error");

    let logs = app
        .request(
            "GET",
            "/api/biometric/attendance/staff/EMP0042",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(logs.body["data"]["total_items"], 1);
    assert_eq!(logs.body["data"]["items"][0]["machine_id"], "M1");
}

#[tokio::test]
async fn test_validate_upload_writes_nothing() {
    let (app, admin) = enrolled_app().await;
    let txt = "42\t1\t2024-01-15 09:00:00\t1\t1\n";

    let response = app
        .upload(
            "/api/biometric/attendance/import/validate",
            "M1",
            "attlog.txt",
            txt,
            &admin.token,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["dry_run"], true);
    assert_eq!(response.body["data"]["imported_count"], 1);

    let logs = app
        .request("GET", "/api/biometric/attendance", None, Some(&admin.token))
        .await;
    assert_eq!(logs.body["data"]["total_items"], 0);
}

#[tokio::test]
async fn test_upload_with_unsupported_extension_is_rejected() {
    let (app, admin) = enrolled_app().await;

    let response = app
        .upload(
            "/api/biometric/attendance/import",
            "M1",
            "export.xlsx",
            "42,1,2024-01-15 09:00:00,1,1\n",
            &admin.token,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_requires_permission() {
    let (app, _) = enrolled_app().await;
    let viewer = app
        .user("viewer", UserRole::Staff, &["attendance:view"])
        .await;

    let response = app
        .upload(
            "/api/biometric/attendance/import",
            "M1",
            "export.csv",
            "42,1,2024-01-15 09:00:00,1,1\n",
            &viewer.token,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_sample_download() {
    let app = helpers::TestApp::new();
    let viewer = app
        .user("viewer", UserRole::Staff, &["attendance:view"])
        .await;

    let csv = app
        .request(
            "GET",
            "/api/biometric/attendance/import/sample",
            None,
            Some(&viewer.token),
        )
        .await;
    assert_eq!(csv.status, StatusCode::OK);
    assert!(csv.content_type.starts_with("text/csv"));
    assert!(csv.text.starts_with("deviceUserId,userSn,recordTime"));

    let txt = app
        .request(
            "GET",
            "/api/biometric/attendance/import/sample?format=txt",
            None,
            Some(&viewer.token),
        )
        .await;
    assert!(txt.content_type.starts_with("text/plain"));
    assert!(txt.text.contains('\t'));
}

#[tokio::test]
async fn test_manual_entry_and_stats() {
    let (app, admin) = enrolled_app().await;

    let created = app
        .request(
            "POST",
            "/api/biometric/attendance",
            Some(serde_json::json!({
                "staff_id": "EMP0042",
                "machine_id": "M1",
                "punch_type": "check-out",
                "timestamp": "2024-01-15 18:30:00",
                "remarks": "Forgot to punch",
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["data"]["punch_type"], "check-out");
    assert_eq!(created.body["data"]["staff_name_snapshot"], "Asha Rao");
    assert_eq!(created.body["data"]["location_snapshot"], "Front desk");

    let stats = app
        .request("GET", "/api/biometric/attendance/stats", None, Some(&admin.token))
        .await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["data"]["total"], 1);
    assert_eq!(stats.body["data"]["by_machine"][0]["machine_name"], "M1 terminal");

    let filtered = app
        .request(
            "GET",
            "/api/biometric/attendance?punch_type=check-in",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(filtered.body["data"]["total_items"], 0);
}

#[tokio::test]
async fn test_manual_entry_with_bad_timestamp() {
    let (app, admin) = enrolled_app().await;

    let response = app
        .request(
            "POST",
            "/api/biometric/attendance",
            Some(serde_json::json!({
                "staff_id": "EMP0042",
                "machine_id": "M1",
                "punch_type": "check-in",
                "timestamp": "not-a-date",
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "UNPARSABLE_TIMESTAMP");
}

#[tokio::test]
async fn test_pagination_of_machine_logs() {
    let (app, admin) = enrolled_app().await;
    let endpoint = clubhouse_device::DeviceEndpoint::new("10.0.0.1", 4370);
    for (sn, hour) in [(1, 7), (2, 9), (3, 12)] {
        app.mock.push_punch(&endpoint, record(sn, "42", hour));
    }
    app.request("POST", "/api/biometric/attendance/sync/M1", None, Some(&admin.token))
        .await;

    let page = app
        .request(
            "GET",
            "/api/biometric/attendance/machine/M1?page=2&page_size=2",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["data"]["total_items"], 3);
    assert_eq!(page.body["data"]["total_pages"], 2);
    assert_eq!(page.body["data"]["items"].as_array().unwrap().len(), 1);
}
