mod common;

use clubhouse_core::ErrorKind;
use clubhouse_core::types::pagination::PageRequest;
use clubhouse_database::store::AttendanceFilter;
use clubhouse_entity::attendance::PunchType;
use clubhouse_entity::machine::MachineStatus;
use clubhouse_service::attendance::{ImportFormat, RowStatus};

use common::{Fixture, endpoint, punch};

async fn assigned_fixture() -> Fixture {
    let fx = Fixture::new();
    fx.machine("M1", "10.0.0.1").await;
    fx.staff("EMP0042", "Asha Rao").await;
    fx.services.identity.assign("EMP0042", "M1").await.unwrap();
    fx
}

#[tokio::test]
async fn test_sync_dedups_and_skips_unmapped() {
    let fx = assigned_fixture().await;
    let ep = endpoint("10.0.0.1");
    fx.mock.push_punch(&ep, punch(1, "42", 9, 0));
    fx.mock.push_punch(&ep, punch(2, "42", 18, 0));
    fx.mock.push_punch(&ep, punch(3, "99", 9, 10));

    let first = fx.services.ingest.sync_machine("M1").await.unwrap();
    assert_eq!(first.total_records, 3);
    assert_eq!(first.synced_count, 2);
    assert_eq!(first.duplicate_count, 0);
    assert_eq!(first.skipped_count, 1);
    assert_eq!(first.skipped_logs[0].device_user_id, "99");
    assert!(first.user_mapping["99"].is_none());
    assert_eq!(first.user_mapping["42"].as_ref().unwrap().staff_id, "EMP0042");

    let second = fx.services.ingest.sync_machine("M1").await.unwrap();
    assert_eq!(second.synced_count, 0);
    assert_eq!(second.duplicate_count, 2);
    assert_eq!(second.skipped_count, 1);
    assert_eq!(second.user_mapping["42"].as_ref().unwrap().staff_id, "EMP0042");

    let logs = fx
        .services
        .attendance
        .by_machine("M1", AttendanceFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(logs.total_items, 2);
    assert!(logs.items.iter().all(|l| l.punch_type == PunchType::CheckIn));
    assert_eq!(logs.items[0].location_snapshot.as_deref(), Some("Main gym"));

    let machine = fx.stores.machines.find_by_machine_id("M1").await.unwrap().unwrap();
    assert_eq!(machine.status, MachineStatus::Online);
    assert_eq!(machine.total_logs, 2);
}

#[tokio::test]
async fn test_resync_of_duplicates_still_reports_mapping() {
    let fx = assigned_fixture().await;
    fx.mock.push_punch(&endpoint("10.0.0.1"), punch(1, "42", 9, 0));
    fx.services.ingest.sync_machine("M1").await.unwrap();

    let again = fx.services.ingest.sync_machine("M1").await.unwrap();
    assert_eq!(again.duplicate_count, 1);
    assert_eq!(again.synced_count, 0);
    assert_eq!(again.user_mapping.len(), 1);
    assert_eq!(again.user_mapping["42"].as_ref().unwrap().name, "Asha Rao");
}

#[tokio::test]
async fn test_sync_of_unreachable_machine_marks_offline() {
    let fx = assigned_fixture().await;
    fx.mock.set_reachable(&endpoint("10.0.0.1"), false);

    let err = fx.services.ingest.sync_machine("M1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DeviceUnreachable);
    let machine = fx.stores.machines.find_by_machine_id("M1").await.unwrap().unwrap();
    assert_eq!(machine.status, MachineStatus::Offline);

    let missing = fx.services.ingest.sync_machine("NOPE").await.unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_sync_of_empty_terminal_succeeds() {
    let fx = assigned_fixture().await;
    let report = fx.services.ingest.sync_machine("M1").await.unwrap();
    assert_eq!(report.total_records, 0);
    assert_eq!(report.synced_count, 0);
}

#[tokio::test]
async fn test_three_row_csv_success_duplicate_error() {
    let fx = assigned_fixture().await;
    fx.mock.push_punch(&endpoint("10.0.0.1"), punch(1, "42", 9, 0));
    fx.services.ingest.sync_machine("M1").await.unwrap();

    let csv = "deviceUserId,userSn,recordTime,recordType,verifyMode\n\
               42,2,2024-01-15 18:00:00,2,1\n\
               42,1,2024-01-15 09:00:00,1,1\n\
               42,3,not-a-date,1,1\n";
    let report = fx
        .services
        .ingest
        .import_file("M1", csv, ImportFormat::Csv)
        .await
        .unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.imported_count, 1);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(report.error_count, 1);
    assert!(!report.dry_run);
    let statuses: Vec<(usize, RowStatus)> =
        report.import_details.iter().map(|d| (d.row, d.status)).collect();
    assert_eq!(
        statuses,
        vec![(2, RowStatus::Success), (3, RowStatus::Duplicate), (4, RowStatus::Error)]
    );
    assert_eq!(report.import_details[0].staff_id.as_deref(), Some("EMP0042"));
    assert!(
        report.import_details[2]
            .message
            .as_deref()
            .unwrap()
            .contains("not-a-date")
    );

    let logs = fx
        .services
        .attendance
        .by_staff("EMP0042", AttendanceFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(logs.total_items, 2);
    assert_eq!(logs.items[0].punch_type, PunchType::CheckOut);
}

#[tokio::test]
async fn test_unmapped_rows_are_reported_and_batch_continues() {
    let fx = assigned_fixture().await;
    let txt = "77\t1\t2024-01-15 09:00:00\t1\t1\n42\t2\t2024-01-15 09:30:00\t1\t1\n";
    let report = fx
        .services
        .ingest
        .import_file("M1", txt, ImportFormat::Txt)
        .await
        .unwrap();

    assert_eq!(report.unmapped_users, vec!["77".to_string()]);
    assert_eq!(report.unmapped_count, 1);
    assert_eq!(report.imported_count, 1);
    assert_eq!(report.import_details[0].status, RowStatus::Unmapped);
    assert_eq!(
        fx.stores.attendance.count_for_machine("M1").await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_validate_never_writes_but_flags_in_file_duplicates() {
    let fx = assigned_fixture().await;
    let csv = "42,1,2024-01-15 09:00:00,1,1\n42,1,2024-01-15 09:00:00,1,1\n";

    let report = fx
        .services
        .ingest
        .validate_file("M1", csv, ImportFormat::Csv)
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.imported_count, 1);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(fx.stores.attendance.count_for_machine("M1").await.unwrap(), 0);

    let committed = fx
        .services
        .ingest
        .import_file("M1", csv, ImportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(committed.imported_count, 1);
    assert_eq!(committed.duplicate_count, 1);
    assert_eq!(fx.stores.attendance.count_for_machine("M1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_stats_join_machine_names() {
    let fx = assigned_fixture().await;
    let ep = endpoint("10.0.0.1");
    fx.mock.push_punch(&ep, punch(1, "42", 9, 0));
    fx.mock.push_punch(&ep, punch(2, "42", 18, 0));
    fx.services.ingest.sync_machine("M1").await.unwrap();

    let stats = fx.services.attendance.stats(&AttendanceFilter::default()).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_machine.len(), 1);
    assert_eq!(stats.by_machine[0].machine_name.as_deref(), Some("M1 terminal"));
    assert_eq!(stats.by_punch_type[0].key, "check-in");
    assert_eq!(stats.by_method[0].count, 2);
}
