mod common;

use std::time::Duration;

use clubhouse_core::ErrorKind;
use clubhouse_device::MockTerminal;

use common::{Fixture, endpoint};

#[tokio::test]
async fn test_assign_is_idempotent_and_exclusive() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.machine("M2", "10.0.0.2").await;
    fx.staff("EMP0042", "Asha Rao").await;

    let first = fx.services.identity.assign("EMP0042", "M1").await.unwrap();
    assert_eq!(first.device_user_id, "42");
    assert!(!first.already_assigned);
    let enrolled = fx.mock.users(&endpoint("10.0.0.1"));
    assert_eq!(enrolled.len(), 1);
    assert_eq!(enrolled[0].uid, 42);
    assert_eq!(enrolled[0].name, "Asha Rao");

    let connects = fx.mock.connect_count();
    let again = fx.services.identity.assign("EMP0042", "M1").await.unwrap();
    assert!(again.already_assigned);
    assert_eq!(again.device_user_id, "42");
    assert_eq!(fx.mock.connect_count(), connects);

    let err = fx.services.identity.assign("EMP0042", "M2").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyAssigned);
    assert!(fx.mock.users(&endpoint("10.0.0.2")).is_empty());
}

#[tokio::test]
async fn test_concurrent_assign_to_two_machines_keeps_one() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.machine("M2", "10.0.0.2").await;
    fx.staff("EMP0042", "Asha Rao").await;
    fx.mock.set_connect_delay(Duration::from_millis(50));

    let (on_m1, on_m2) = tokio::join!(
        fx.services.identity.assign("EMP0042", "M1"),
        fx.services.identity.assign("EMP0042", "M2"),
    );
    assert_eq!(on_m1.is_ok() as u8 + on_m2.is_ok() as u8, 1);
    let (winner, winner_ip, loser_ip, err) = match (on_m1, on_m2) {
        (Ok(_), Err(e)) => ("M1", "10.0.0.1", "10.0.0.2", e),
        (Err(e), Ok(_)) => ("M2", "10.0.0.2", "10.0.0.1", e),
        _ => unreachable!(),
    };
    assert_eq!(err.kind, ErrorKind::AlreadyAssigned);

    let staff = fx.stores.staff.find_by_staff_id("EMP0042").await.unwrap().unwrap();
    assert_eq!(staff.biometric_device_id.as_deref(), Some(winner));
    assert_eq!(fx.mock.users(&endpoint(winner_ip)).len(), 1);
    assert!(fx.mock.users(&endpoint(loser_ip)).is_empty());
}

#[tokio::test]
async fn test_assign_rejects_held_device_user_id() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;
    fx.staff("TMP42", "Ravi Kumar").await;

    fx.services.identity.assign("EMP0042", "M1").await.unwrap();
    let err = fx.services.identity.assign("TMP42", "M1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let holder = fx.services.identity.resolve("M1", "42").await.unwrap().unwrap();
    assert_eq!(holder.staff_id, "EMP0042");
}

#[tokio::test]
async fn test_failed_provisioning_leaves_mapping_unset() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.mock.add_terminal(
        endpoint("10.0.0.1"),
        MockTerminal {
            reject_writes: true,
            ..MockTerminal::default()
        },
    );
    fx.staff("EMP0042", "Asha Rao").await;

    let err = fx.services.identity.assign("EMP0042", "M1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Protocol);
    let staff = fx.stores.staff.find_by_staff_id("EMP0042").await.unwrap().unwrap();
    assert!(staff.biometric_device_id.is_none());

    fx.mock.set_reachable(&endpoint("10.0.0.1"), false);
    let err = fx.services.identity.assign("EMP0042", "M1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DeviceUnreachable);
}

#[tokio::test]
async fn test_unknown_staff_or_machine() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;

    let err = fx.services.identity.assign("EMP9999", "M1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = fx.services.identity.assign("EMP0042", "M9").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unassign_clears_mapping_even_when_device_is_down() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;
    fx.services.identity.assign("EMP0042", "M1").await.unwrap();

    fx.mock.set_reachable(&endpoint("10.0.0.1"), false);
    let result = fx.services.identity.unassign("EMP0042").await.unwrap();
    assert!(!result.device_removed);
    assert!(result.device_error.is_some());
    assert_eq!(result.device_user_id.as_deref(), Some("42"));

    let staff = fx.stores.staff.find_by_staff_id("EMP0042").await.unwrap().unwrap();
    assert!(staff.biometric_device_id.is_none());
    assert!(staff.biometric_device_user_id.is_none());
    assert!(fx.services.identity.resolve("M1", "42").await.unwrap().is_none());

    let err = fx.services.identity.unassign("EMP0042").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_unassign_removes_user_from_terminal() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;
    fx.services.identity.assign("EMP0042", "M1").await.unwrap();

    let result = fx.services.identity.unassign("EMP0042").await.unwrap();
    assert!(result.device_removed);
    assert!(fx.mock.users(&endpoint("10.0.0.1")).is_empty());
}

#[tokio::test]
async fn test_sync_to_machine_reports_each_staff() {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;
    fx.staff("EMP0043", "Ravi Kumar").await;
    fx.services.identity.assign("EMP0042", "M1").await.unwrap();
    fx.services.identity.assign("EMP0043", "M1").await.unwrap();

    let report = fx.services.identity.sync_to_machine("M1").await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.provisioned, 2);
    assert_eq!(report.failed, 0);

    fx.mock.set_reachable(&endpoint("10.0.0.1"), false);
    let report = fx.services.identity.sync_to_machine("M1").await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.failed, 2);
    assert!(report.results.iter().all(|r| r.error.is_some()));
}
