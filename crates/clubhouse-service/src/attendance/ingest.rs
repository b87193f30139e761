//! Live terminal sync and file import.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use clubhouse_core::config::ImportConfig;
use clubhouse_core::error::AppError;
use clubhouse_database::store::{AttendanceLogStore, MachineStore};
use clubhouse_device::{DeviceGateway, DeviceRecord};
use clubhouse_entity::attendance::{AttendanceLog, DedupKey, PunchStatus, PunchType, VerifyMethod};
use clubhouse_entity::machine::{Machine, MachineStatus};
use clubhouse_entity::staff::Staff;

use super::parser::{ImportFormat, RawRow, parse_rows};
use super::timestamp::TimestampParser;
use crate::identity::{IdentityService, StaffSummary};
use crate::machine::{endpoint_of, find_active_machine};

/// A device record that could not be attributed to a staff member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedLog {
    pub device_user_id: String,
    pub user_sn: u16,
    pub record_time: NaiveDateTime,
    pub reason: String,
}

/// A per-record store failure during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordError {
    pub device_user_id: String,
    pub user_sn: u16,
    pub message: String,
}

/// Outcome of a live sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub machine_id: String,
    pub total_records: usize,
    pub synced_count: usize,
    pub duplicate_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    /// Device user id to the staff it resolved to, or null.
    pub user_mapping: BTreeMap<String, Option<StaffSummary>>,
    pub skipped_logs: Vec<SkippedLog>,
    pub errors: Vec<RecordError>,
    pub synced_at: DateTime<Utc>,
}

/// Classification of one import row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Success,
    Duplicate,
    Error,
    Unmapped,
}

/// Per-row import detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDetail {
    pub row: usize,
    pub device_user_id: String,
    pub staff_id: Option<String>,
    pub staff_name: Option<String>,
    /// Original text of the record time column.
    pub record_time: String,
    pub status: RowStatus,
    pub message: Option<String>,
}

/// Outcome of an import or a validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub machine_id: String,
    pub format: ImportFormat,
    pub dry_run: bool,
    pub total_rows: usize,
    pub imported_count: usize,
    pub duplicate_count: usize,
    pub error_count: usize,
    pub unmapped_count: usize,
    pub unmapped_users: Vec<String>,
    pub import_details: Vec<ImportDetail>,
    pub details_truncated: bool,
}

impl ImportReport {
    fn tally(&mut self, detail: ImportDetail, max_details: usize) {
        match detail.status {
            RowStatus::Success => self.imported_count += 1,
            RowStatus::Duplicate => self.duplicate_count += 1,
            RowStatus::Error => self.error_count += 1,
            RowStatus::Unmapped => self.unmapped_count += 1,
        }
        if self.import_details.len() < max_details {
            self.import_details.push(detail);
        } else {
            self.details_truncated = true;
        }
    }
}

fn log_for(staff: &Staff, machine: &Machine, timestamp: DateTime<Utc>) -> AttendanceLog {
    let now = Utc::now();
    AttendanceLog {
        log_id: Uuid::now_v7(),
        staff_id: staff.staff_id.clone(),
        machine_id: machine.machine_id.clone(),
        staff_name_snapshot: staff.name.clone(),
        timestamp,
        punch_type: PunchType::CheckIn,
        method: VerifyMethod::Fingerprint,
        location_snapshot: machine.location.clone(),
        ip_snapshot: Some(machine.ip_address.clone()),
        status: PunchStatus::Success,
        remarks: None,
        raw_device_data: None,
        device_user_id: None,
        user_sn: None,
        is_deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn parse_code(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Pulls punches from terminals and export files into the log store.
#[derive(Debug, Clone)]
pub struct IngestService {
    attendance: Arc<dyn AttendanceLogStore>,
    machines: Arc<dyn MachineStore>,
    identity: IdentityService,
    gateway: DeviceGateway,
    timestamps: TimestampParser,
    config: ImportConfig,
}

impl IngestService {
    /// Creates a new ingest service.
    pub fn new(
        attendance: Arc<dyn AttendanceLogStore>,
        machines: Arc<dyn MachineStore>,
        identity: IdentityService,
        gateway: DeviceGateway,
        timestamps: TimestampParser,
        config: ImportConfig,
    ) -> Self {
        Self {
            attendance,
            machines,
            identity,
            gateway,
            timestamps,
            config,
        }
    }

    async fn refresh_machine(&self, machine_id: &str) {
        if let Err(e) = self
            .machines
            .update_status(machine_id, MachineStatus::Online, Some(Utc::now()))
            .await
        {
            warn!(machine_id = %machine_id, error = %e, "Failed to record machine status");
        }
        self.refresh_counters(machine_id).await;
    }

    /// Pull every punch from a terminal and persist the attributable ones.
    pub async fn sync_machine(&self, machine_id: &str) -> Result<SyncReport, AppError> {
        let machine = find_active_machine(self.machines.as_ref(), machine_id).await?;
        let endpoint = endpoint_of(&self.gateway, &machine);

        let records = match self.gateway.fetch_punches(&endpoint).await {
            Ok(records) => records,
            Err(e) => {
                if e.is_unreachable() {
                    if let Err(status_err) = self
                        .machines
                        .update_status(machine_id, MachineStatus::Offline, None)
                        .await
                    {
                        warn!(machine_id = %machine_id, error = %status_err, "Failed to record machine status");
                    }
                }
                warn!(machine_id = %machine_id, error = %e, "Attendance sync failed");
                return Err(e.into());
            }
        };

        let mut report = SyncReport {
            machine_id: machine.machine_id.clone(),
            total_records: records.len(),
            synced_count: 0,
            duplicate_count: 0,
            skipped_count: 0,
            error_count: 0,
            user_mapping: BTreeMap::new(),
            skipped_logs: Vec::new(),
            errors: Vec::new(),
            synced_at: Utc::now(),
        };
        let mut cache: HashMap<String, Option<Staff>> = HashMap::new();

        for record in &records {
            match self.sync_record(&machine, record, &mut cache).await {
                Ok(SyncOutcome::Synced) => report.synced_count += 1,
                Ok(SyncOutcome::Duplicate) => report.duplicate_count += 1,
                Ok(SyncOutcome::Skipped) => {
                    report.skipped_count += 1;
                    if report.skipped_logs.len() < self.config.max_skipped_logs {
                        report.skipped_logs.push(SkippedLog {
                            device_user_id: record.device_user_id.clone(),
                            user_sn: record.user_sn,
                            record_time: record.record_time,
                            reason: format!(
                                "No staff mapped to device user id '{}'",
                                record.device_user_id
                            ),
                        });
                    }
                }
                Err(e) => {
                    report.error_count += 1;
                    error!(
                        machine_id = %machine_id,
                        device_user_id = %record.device_user_id,
                        error = %e,
                        "Failed to store synced punch"
                    );
                    if report.errors.len() < self.config.max_skipped_logs {
                        report.errors.push(RecordError {
                            device_user_id: record.device_user_id.clone(),
                            user_sn: record.user_sn,
                            message: e.message,
                        });
                    }
                }
            }
        }

        report.user_mapping = cache
            .into_iter()
            .map(|(id, staff)| (id, staff.as_ref().map(StaffSummary::from)))
            .collect();
        self.refresh_machine(machine_id).await;

        info!(
            machine_id = %machine_id,
            total = report.total_records,
            synced = report.synced_count,
            duplicates = report.duplicate_count,
            skipped = report.skipped_count,
            "Attendance sync finished"
        );
        Ok(report)
    }

    async fn sync_record(
        &self,
        machine: &Machine,
        record: &DeviceRecord,
        cache: &mut HashMap<String, Option<Staff>>,
    ) -> Result<SyncOutcome, AppError> {
        let timestamp = self.timestamps.localize(record.record_time);
        let key = DedupKey {
            machine_id: machine.machine_id.clone(),
            timestamp,
            device_user_id: record.device_user_id.clone(),
            user_sn: i32::from(record.user_sn),
        };
        // Resolved before the dedup check so duplicates still show up in the mapping.
        let staff = match cache.get(&record.device_user_id) {
            Some(cached) => cached.clone(),
            None => {
                let found = self
                    .identity
                    .resolve(&machine.machine_id, &record.device_user_id)
                    .await?;
                cache.insert(record.device_user_id.clone(), found.clone());
                found
            }
        };
        if self.attendance.exists(&key).await? {
            return Ok(SyncOutcome::Duplicate);
        }
        let Some(staff) = staff else {
            return Ok(SyncOutcome::Skipped);
        };

        let mut log = log_for(&staff, machine, timestamp);
        log.raw_device_data = Some(serde_json::to_value(record)?);
        log.device_user_id = Some(key.device_user_id);
        log.user_sn = Some(key.user_sn);

        match self.attendance.insert(&log).await? {
            Some(_) => Ok(SyncOutcome::Synced),
            None => Ok(SyncOutcome::Duplicate),
        }
    }

    /// Import an export file, persisting every row classified as success.
    pub async fn import_file(
        &self,
        machine_id: &str,
        content: &str,
        format: ImportFormat,
    ) -> Result<ImportReport, AppError> {
        self.run_import(machine_id, content, format, false).await
    }

    /// Classify an export file without writing anything.
    pub async fn validate_file(
        &self,
        machine_id: &str,
        content: &str,
        format: ImportFormat,
    ) -> Result<ImportReport, AppError> {
        self.run_import(machine_id, content, format, true).await
    }

    async fn run_import(
        &self,
        machine_id: &str,
        content: &str,
        format: ImportFormat,
        dry_run: bool,
    ) -> Result<ImportReport, AppError> {
        if content.len() > self.config.max_file_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the maximum size of {} bytes",
                self.config.max_file_size_bytes
            )));
        }
        let machine = find_active_machine(self.machines.as_ref(), machine_id).await?;
        let rows = parse_rows(content, format);

        let distinct: BTreeSet<String> = rows.iter().map(|r| r.device_user_id.clone()).collect();
        let ids: Vec<String> = distinct.iter().cloned().collect();
        let resolved = self.identity.resolve_many(machine_id, &ids).await?;
        let unmapped_users: Vec<String> = distinct
            .into_iter()
            .filter(|id| !resolved.contains_key(id))
            .collect();

        let mut report = ImportReport {
            machine_id: machine.machine_id.clone(),
            format,
            dry_run,
            total_rows: rows.len(),
            imported_count: 0,
            duplicate_count: 0,
            error_count: 0,
            unmapped_count: 0,
            unmapped_users,
            import_details: Vec::new(),
            details_truncated: false,
        };
        let mut accepted: HashSet<DedupKey> = HashSet::new();

        for row in &rows {
            let staff = resolved.get(&row.device_user_id);
            let (status, message) = self
                .import_row(&machine, row, staff, format, dry_run, &mut accepted)
                .await;
            report.tally(
                ImportDetail {
                    row: row.row,
                    device_user_id: row.device_user_id.clone(),
                    staff_id: staff.map(|s| s.staff_id.clone()),
                    staff_name: staff.map(|s| s.name.clone()),
                    record_time: row.record_time.clone(),
                    status,
                    message,
                },
                self.config.max_detail_rows,
            );
        }

        if !dry_run && report.imported_count > 0 {
            self.refresh_counters(machine_id).await;
        }
        info!(
            machine_id = %machine_id,
            format = %format,
            dry_run,
            rows = report.total_rows,
            imported = report.imported_count,
            duplicates = report.duplicate_count,
            errors = report.error_count,
            unmapped = report.unmapped_count,
            "Attendance file processed"
        );
        Ok(report)
    }

    async fn refresh_counters(&self, machine_id: &str) {
        let counted = match self.attendance.count_for_machine(machine_id).await {
            Ok(count) => self
                .machines
                .update_counters(machine_id, None, Some(i32::try_from(count).unwrap_or(i32::MAX)))
                .await,
            Err(e) => Err(e),
        };
        if let Err(e) = counted {
            warn!(machine_id = %machine_id, error = %e, "Failed to refresh cached log count");
        }
    }

    async fn import_row(
        &self,
        machine: &Machine,
        row: &RawRow,
        staff: Option<&Staff>,
        format: ImportFormat,
        dry_run: bool,
        accepted: &mut HashSet<DedupKey>,
    ) -> (RowStatus, Option<String>) {
        let timestamp = self.timestamps.parse(&row.record_time);
        let user_sn = row.user_sn.trim().parse::<i32>().ok();

        let key = match (&timestamp, user_sn) {
            (Ok(ts), Some(sn)) => Some(DedupKey {
                machine_id: machine.machine_id.clone(),
                timestamp: *ts,
                device_user_id: row.device_user_id.clone(),
                user_sn: sn,
            }),
            _ => None,
        };
        if let Some(key) = &key {
            let stored = match self.attendance.exists(key).await {
                Ok(stored) => stored,
                Err(e) => return (RowStatus::Error, Some(e.message)),
            };
            if stored || accepted.contains(key) {
                return (RowStatus::Duplicate, Some("Duplicate record".to_string()));
            }
        }

        let timestamp = match timestamp {
            Ok(ts) => ts,
            Err(e) => return (RowStatus::Error, Some(e.message)),
        };
        let (Some(key), Some(user_sn)) = (key, user_sn) else {
            return (
                RowStatus::Error,
                Some(format!("Invalid userSn '{}'", row.user_sn)),
            );
        };
        let Some(staff) = staff else {
            return (
                RowStatus::Unmapped,
                Some(format!(
                    "No staff mapped to device user id '{}'",
                    row.device_user_id
                )),
            );
        };

        if dry_run {
            accepted.insert(key);
            return (RowStatus::Success, None);
        }

        let record_type = parse_code(row.record_type.as_deref());
        let verify_mode = parse_code(row.verify_mode.as_deref());
        let mut log = log_for(staff, machine, timestamp);
        log.punch_type = PunchType::from_record_type(record_type);
        log.method = VerifyMethod::from_verify_mode(verify_mode);
        log.remarks = Some(format!("Imported from {format} file"));
        log.raw_device_data = Some(json!({
            "device_user_id": row.device_user_id,
            "user_sn": user_sn,
            "record_time": row.record_time,
            "record_type": record_type,
            "verify_mode": verify_mode,
            "source": "import",
        }));
        log.device_user_id = Some(key.device_user_id.clone());
        log.user_sn = Some(user_sn);

        match self.attendance.insert(&log).await {
            Ok(Some(_)) => {
                accepted.insert(key);
                (RowStatus::Success, None)
            }
            Ok(None) => (RowStatus::Duplicate, Some("Duplicate record".to_string())),
            Err(e) => {
                error!(row = row.row, error = %e, "Failed to store imported punch");
                (RowStatus::Error, Some(e.message))
            }
        }
    }
}

enum SyncOutcome {
    Synced,
    Duplicate,
    Skipped,
}
