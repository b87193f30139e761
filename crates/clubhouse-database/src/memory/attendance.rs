//! In-memory attendance log store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::attendance::{AttendanceLog, DedupKey, PunchStatus};

use super::paginate;
use crate::store::attendance::{AttendanceCounts, AttendanceFilter, AttendanceLogStore, CountBucket};

#[derive(Debug, Default)]
struct Inner {
    logs: HashMap<Uuid, AttendanceLog>,
    /// Dedup keys of every stored log, soft-deleted included.
    keys: HashSet<DedupKey>,
}

/// Attendance logs held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttendanceLogStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryAttendanceLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bucketize(counts: BTreeMap<String, u64>) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(key, count)| CountBucket { key, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    buckets
}

#[async_trait]
impl AttendanceLogStore for MemoryAttendanceLogStore {
    async fn find_by_id(&self, log_id: Uuid) -> Result<Option<AttendanceLog>, AppError> {
        Ok(self.inner.read().await.logs.get(&log_id).cloned())
    }

    async fn exists(&self, key: &DedupKey) -> Result<bool, AppError> {
        Ok(self.inner.read().await.keys.contains(key))
    }

    async fn insert(&self, log: &AttendanceLog) -> Result<Option<AttendanceLog>, AppError> {
        let mut inner = self.inner.write().await;
        if inner.logs.contains_key(&log.log_id) {
            return Err(AppError::conflict(format!("Log {} already exists", log.log_id)));
        }
        if let Some(key) = log.dedup_key() {
            if !inner.keys.insert(key) {
                return Ok(None);
            }
        }
        let mut stored = log.clone();
        stored.is_deleted = false;
        stored.deleted_at = None;
        stored.updated_at = stored.created_at;
        inner.logs.insert(stored.log_id, stored.clone());
        Ok(Some(stored))
    }

    async fn update_timestamp(
        &self,
        log_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<AttendanceLog>, AppError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.logs.get(&log_id).cloned() else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.timestamp = timestamp;
        updated.updated_at = Utc::now();

        if let (Some(old_key), Some(new_key)) = (current.dedup_key(), updated.dedup_key()) {
            if old_key != new_key {
                if inner.keys.contains(&new_key) {
                    return Err(AppError::conflict("Another punch already exists at that time"));
                }
                inner.keys.remove(&old_key);
                inner.keys.insert(new_key);
            }
        }
        inner.logs.insert(log_id, updated.clone());
        Ok(Some(updated))
    }

    async fn update_status(
        &self,
        log_id: Uuid,
        status: PunchStatus,
    ) -> Result<Option<AttendanceLog>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.logs.get_mut(&log_id).map(|log| {
            log.status = status;
            log.updated_at = Utc::now();
            log.clone()
        }))
    }

    async fn soft_delete(&self, log_id: Uuid) -> Result<Option<AttendanceLog>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.logs.get_mut(&log_id).map(|log| {
            let now = Utc::now();
            log.is_deleted = true;
            log.deleted_at = Some(now);
            log.updated_at = now;
            log.clone()
        }))
    }

    async fn query(
        &self,
        filter: &AttendanceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AttendanceLog>, AppError> {
        let inner = self.inner.read().await;
        let mut matched: Vec<AttendanceLog> = inner
            .logs
            .values()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.log_id.cmp(&a.log_id)));
        Ok(paginate(&matched, page))
    }

    async fn stats(&self, filter: &AttendanceFilter) -> Result<AttendanceCounts, AppError> {
        let inner = self.inner.read().await;
        let mut total = 0u64;
        let mut by_punch_type = BTreeMap::new();
        let mut by_method = BTreeMap::new();
        let mut by_machine = BTreeMap::new();

        for log in inner.logs.values().filter(|log| filter.matches(log)) {
            total += 1;
            *by_punch_type.entry(log.punch_type.to_string()).or_insert(0) += 1;
            *by_method.entry(log.method.to_string()).or_insert(0) += 1;
            *by_machine.entry(log.machine_id.clone()).or_insert(0) += 1;
        }

        Ok(AttendanceCounts {
            total,
            by_punch_type: bucketize(by_punch_type),
            by_method: bucketize(by_method),
            by_machine: bucketize(by_machine),
        })
    }

    async fn count_for_machine(&self, machine_id: &str) -> Result<u64, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .logs
            .values()
            .filter(|log| !log.is_deleted && log.machine_id == machine_id)
            .count() as u64)
    }
}
