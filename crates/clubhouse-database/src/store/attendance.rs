//! Attendance log store trait and query types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::attendance::{AttendanceLog, DedupKey, PunchStatus, PunchType};

/// Filter applied to attendance queries and statistics.
///
/// Soft-deleted logs are always excluded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    pub machine_id: Option<String>,
    pub staff_id: Option<String>,
    pub punch_type: Option<PunchType>,
    pub status: Option<PunchStatus>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl AttendanceFilter {
    /// Whether a log passes this filter.
    pub fn matches(&self, log: &AttendanceLog) -> bool {
        !log.is_deleted
            && self.machine_id.as_ref().is_none_or(|m| &log.machine_id == m)
            && self.staff_id.as_ref().is_none_or(|s| &log.staff_id == s)
            && self.punch_type.is_none_or(|p| log.punch_type == p)
            && self.status.is_none_or(|s| log.status == s)
            && self.from.is_none_or(|from| log.timestamp >= from)
            && self.to.is_none_or(|to| log.timestamp <= to)
    }
}

/// A grouped count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBucket {
    pub key: String,
    pub count: u64,
}

/// Grouped totals over the logs matching a filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub total: u64,
    pub by_punch_type: Vec<CountBucket>,
    pub by_method: Vec<CountBucket>,
    /// Keyed by operator-assigned machine id.
    pub by_machine: Vec<CountBucket>,
}

/// Persistence of attendance logs.
#[async_trait]
pub trait AttendanceLogStore: Send + Sync + std::fmt::Debug {
    /// Find a log by id, including soft-deleted logs.
    async fn find_by_id(&self, log_id: Uuid) -> Result<Option<AttendanceLog>, AppError>;

    /// Whether any log (soft-deleted included) carries this dedup key.
    async fn exists(&self, key: &DedupKey) -> Result<bool, AppError>;

    /// Insert a log. Returns `None` without error when the dedup key is
    /// already taken.
    async fn insert(&self, log: &AttendanceLog) -> Result<Option<AttendanceLog>, AppError>;

    /// Overwrite the timestamp of a log.
    async fn update_timestamp(
        &self,
        log_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<AttendanceLog>, AppError>;

    /// Overwrite the status of a log.
    async fn update_status(
        &self,
        log_id: Uuid,
        status: PunchStatus,
    ) -> Result<Option<AttendanceLog>, AppError>;

    /// Flag a log as deleted. The row is retained.
    async fn soft_delete(&self, log_id: Uuid) -> Result<Option<AttendanceLog>, AppError>;

    /// Page through matching logs, newest first.
    async fn query(
        &self,
        filter: &AttendanceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AttendanceLog>, AppError>;

    /// Grouped totals over matching logs.
    async fn stats(&self, filter: &AttendanceFilter) -> Result<AttendanceCounts, AppError>;

    /// Number of live logs recorded against a machine.
    async fn count_for_machine(&self, machine_id: &str) -> Result<u64, AppError>;
}
