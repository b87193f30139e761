mod common;

use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use clubhouse_core::ErrorKind;
use clubhouse_core::types::pagination::PageRequest;
use clubhouse_database::store::AttendanceFilter;
use clubhouse_entity::attendance::{AttendanceLog, PunchStatus};
use clubhouse_entity::notification::NotificationType;
use clubhouse_entity::regularization::{RegularizationStatus, RequestType};
use clubhouse_entity::user::UserRole;
use clubhouse_service::RequestContext;
use clubhouse_service::attendance::NewAttendanceLog;
use clubhouse_service::regularization::NewRegularization;

use common::Fixture;

struct Scene {
    fx: Fixture,
    log: AttendanceLog,
    requester: RequestContext,
    admin: RequestContext,
    other_admin: RequestContext,
    superadmin: RequestContext,
}

async fn scene() -> Scene {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;
    let log = fx
        .services
        .attendance
        .create_log(&NewAttendanceLog {
            staff_id: Some("EMP0042".into()),
            machine_id: Some("M1".into()),
            punch_type: Some("check-in".into()),
            timestamp: Some("2024-01-15 09:00:00".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let requester = fx.user("asha", UserRole::Staff).await;
    let admin = fx.user("admin1", UserRole::Admin).await;
    let other_admin = fx.user("admin2", UserRole::Admin).await;
    let superadmin = fx.user("root", UserRole::SuperAdmin).await;
    Scene {
        fx,
        log,
        requester,
        admin,
        other_admin,
        superadmin,
    }
}

fn time_change(log: &AttendanceLog) -> NewRegularization {
    NewRegularization {
        attendance_log_id: log.log_id,
        request_type: RequestType::TimeChange,
        original_data: Some(json!({ "timestamp": log.timestamp })),
        requested_data: json!({ "timestamp": "2024-01-15 09:05:00" }),
        reason: "Forgot to punch on arrival".to_string(),
    }
}

async fn inbox(s: &Scene, ctx: &RequestContext) -> Vec<NotificationType> {
    s.fx.services
        .notifications
        .list(ctx, None, &PageRequest::default())
        .await
        .unwrap()
        .page
        .items
        .into_iter()
        .map(|n| n.notification_type)
        .collect()
}

#[tokio::test]
async fn test_pending_request_notifies_every_admin() {
    let s = scene().await;
    let outcome = s
        .fx
        .services
        .regularization
        .create_request(&s.requester, time_change(&s.log))
        .await
        .unwrap();

    assert_eq!(outcome.request.status, RegularizationStatus::Pending);
    assert!(outcome.request.notification_sent);
    assert!(outcome.applied.is_none());
    for admin in [&s.admin, &s.other_admin, &s.superadmin] {
        assert_eq!(inbox(&s, admin).await, vec![NotificationType::RegularizationRequest]);
    }
    assert!(inbox(&s, &s.requester).await.is_empty());
}

#[tokio::test]
async fn test_approve_applies_once_and_closes_admin_notifications() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let created = regs.create_request(&s.requester, time_change(&s.log)).await.unwrap();
    let id = created.request.id;

    let approved = regs
        .approve(&s.admin, id, Some("Confirmed with front desk".into()))
        .await
        .unwrap();
    assert_eq!(approved.request.status, RegularizationStatus::Approved);
    assert_eq!(approved.request.approved_by, Some(s.admin.user_id));
    assert_eq!(approved.applied, Some(true));
    assert_eq!(
        approved.attendance_log.unwrap().timestamp,
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).unwrap()
    );

    let err = regs.approve(&s.other_admin, id, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyProcessed);
    let err = regs.reject(&s.other_admin, id, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyProcessed);

    assert_eq!(inbox(&s, &s.requester).await, vec![NotificationType::RegularizationApproved]);
    for admin in [&s.admin, &s.other_admin, &s.superadmin] {
        assert!(inbox(&s, admin).await.is_empty());
    }
}

#[tokio::test]
async fn test_reject_leaves_log_untouched() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let created = regs.create_request(&s.requester, time_change(&s.log)).await.unwrap();

    let rejected = regs
        .reject(&s.admin, created.request.id, Some("  ".into()))
        .await
        .unwrap();
    assert_eq!(rejected.request.status, RegularizationStatus::Rejected);
    assert!(rejected.request.approval_reason.is_none());
    assert!(rejected.applied.is_none());

    let log = s.fx.services.attendance.get(s.log.log_id).await.unwrap();
    assert_eq!(log.timestamp, s.log.timestamp);
    assert_eq!(inbox(&s, &s.requester).await, vec![NotificationType::RegularizationRejected]);
}

#[tokio::test]
async fn test_superadmin_requests_are_auto_approved() {
    let s = scene().await;
    let outcome = s
        .fx
        .services
        .regularization
        .create_request(
            &s.superadmin,
            NewRegularization {
                request_type: RequestType::StatusChange,
                requested_data: json!({ "status": "failed" }),
                ..time_change(&s.log)
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.request.status, RegularizationStatus::Approved);
    assert_eq!(
        outcome.request.approval_reason.as_deref(),
        Some("Auto-approved by superadmin")
    );
    assert!(!outcome.request.notification_sent);
    assert_eq!(outcome.applied, Some(true));
    assert_eq!(outcome.attendance_log.unwrap().status, PunchStatus::Failed);
    for admin in [&s.admin, &s.other_admin, &s.superadmin] {
        assert!(inbox(&s, admin).await.is_empty());
    }
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_up_front() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;

    let blank = NewRegularization {
        reason: "   ".into(),
        ..time_change(&s.log)
    };
    assert_eq!(
        regs.create_request(&s.requester, blank).await.unwrap_err().kind,
        ErrorKind::Validation
    );

    let wrong_shape = NewRegularization {
        requested_data: json!({ "status": "failed" }),
        ..time_change(&s.log)
    };
    assert_eq!(
        regs.create_request(&s.requester, wrong_shape).await.unwrap_err().kind,
        ErrorKind::Validation
    );

    let unknown_log = NewRegularization {
        attendance_log_id: Uuid::new_v4(),
        ..time_change(&s.log)
    };
    assert_eq!(
        regs.create_request(&s.requester, unknown_log).await.unwrap_err().kind,
        ErrorKind::NotFound
    );

    assert_eq!(
        regs.approve(&s.admin, Uuid::new_v4(), None).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_delete_log_hides_log_and_blocks_new_requests() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let created = regs
        .create_request(
            &s.requester,
            NewRegularization {
                request_type: RequestType::DeleteLog,
                requested_data: json!({}),
                ..time_change(&s.log)
            },
        )
        .await
        .unwrap();
    let approved = regs.approve(&s.admin, created.request.id, None).await.unwrap();
    assert_eq!(approved.applied, Some(true));

    let live = s
        .fx
        .services
        .attendance
        .list(&AttendanceFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(live.total_items, 0);

    let err = regs.create_request(&s.requester, time_change(&s.log)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(regs.history(s.log.log_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_change_to_deleted_log_is_not_applied() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let retime = regs.create_request(&s.requester, time_change(&s.log)).await.unwrap();
    let delete = regs
        .create_request(
            &s.requester,
            NewRegularization {
                request_type: RequestType::DeleteLog,
                requested_data: json!({}),
                ..time_change(&s.log)
            },
        )
        .await
        .unwrap();

    let deleted = regs.approve(&s.admin, delete.request.id, None).await.unwrap();
    assert_eq!(deleted.applied, Some(true));

    let approved = regs.approve(&s.admin, retime.request.id, None).await.unwrap();
    assert_eq!(approved.request.status, RegularizationStatus::Approved);
    assert_eq!(approved.applied, Some(false));
    assert!(approved.apply_error.unwrap().contains("not found"));

    let stored = s
        .fx
        .stores
        .attendance
        .find_by_id(s.log.log_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_deleted);
    assert_eq!(stored.timestamp, s.log.timestamp);
}

#[tokio::test]
async fn test_concurrent_approve_and_reject_resolve_once() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let created = regs.create_request(&s.requester, time_change(&s.log)).await.unwrap();
    let id = created.request.id;

    let (approved, rejected) = tokio::join!(
        regs.approve(&s.admin, id, None),
        regs.reject(&s.other_admin, id, Some("Not on shift".into())),
    );
    let (winner, lost) = match (approved, rejected) {
        (Ok(outcome), Err(e)) => (outcome, e),
        (Err(e), Ok(outcome)) => (outcome, e),
        (a, r) => panic!("expected exactly one resolution, got {a:?} and {r:?}"),
    };
    assert_eq!(lost.kind, ErrorKind::AlreadyProcessed);

    let history = regs.history(s.log.log_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, winner.request.status);
    assert_eq!(inbox(&s, &s.requester).await.len(), 1);
}

#[tokio::test]
async fn test_failed_apply_keeps_approval() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let created = regs
        .create_request(
            &s.requester,
            NewRegularization {
                request_type: RequestType::AddLog,
                requested_data: json!({
                    "staff_id": "EMP9999",
                    "machine_id": "M1",
                    "punch_type": "check-out",
                    "timestamp": "2024-01-15 18:00:00",
                }),
                ..time_change(&s.log)
            },
        )
        .await
        .unwrap();

    let approved = regs.approve(&s.admin, created.request.id, None).await.unwrap();
    assert_eq!(approved.request.status, RegularizationStatus::Approved);
    assert_eq!(approved.applied, Some(false));
    assert!(approved.apply_error.unwrap().contains("EMP9999"));
    assert!(approved.attendance_log.is_none());
}

#[tokio::test]
async fn test_add_log_creates_new_log() {
    let s = scene().await;
    let outcome = s
        .fx
        .services
        .regularization
        .create_request(
            &s.superadmin,
            NewRegularization {
                request_type: RequestType::AddLog,
                requested_data: json!({
                    "staff_id": "EMP0042",
                    "machine_id": "M1",
                    "punch_type": "check-out",
                    "timestamp": "2024-01-15 18:00:00",
                }),
                ..time_change(&s.log)
            },
        )
        .await
        .unwrap();

    let created = outcome.attendance_log.unwrap();
    assert_ne!(created.log_id, s.log.log_id);
    assert_eq!(created.staff_id, "EMP0042");
    let all = s
        .fx
        .services
        .attendance
        .by_staff("EMP0042", AttendanceFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_items, 2);
}

#[tokio::test]
async fn test_non_admins_only_list_their_own_requests() {
    let s = scene().await;
    let regs = &s.fx.services.regularization;
    let colleague = s.fx.user("ravi", UserRole::Staff).await;
    regs.create_request(&s.requester, time_change(&s.log)).await.unwrap();
    regs.create_request(&colleague, time_change(&s.log)).await.unwrap();

    let page = PageRequest::default();
    let own = regs.list(&s.requester, None, &page).await.unwrap();
    assert_eq!(own.total_items, 1);
    assert_eq!(own.items[0].requested_by, s.requester.user_id);

    let all = regs.list(&s.admin, None, &page).await.unwrap();
    assert_eq!(all.total_items, 2);
    let approved = regs
        .list(&s.admin, Some(RegularizationStatus::Approved), &page)
        .await
        .unwrap();
    assert_eq!(approved.total_items, 0);
}
