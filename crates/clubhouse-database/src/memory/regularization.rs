//! In-memory regularization request store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::regularization::RegularizationRequest;

use super::paginate;
use crate::store::regularization::{RegularizationFilter, RegularizationStore, Resolution};

/// Regularization requests held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegularizationStore {
    requests: Arc<RwLock<HashMap<Uuid, RegularizationRequest>>>,
}

impl MemoryRegularizationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(items: &mut [RegularizationRequest]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

#[async_trait]
impl RegularizationStore for MemoryRegularizationStore {
    async fn create(
        &self,
        request: &RegularizationRequest,
    ) -> Result<RegularizationRequest, AppError> {
        self.requests
            .write()
            .await
            .insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RegularizationRequest>, AppError> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &RegularizationFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<RegularizationRequest>, AppError> {
        let mut items: Vec<RegularizationRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| filter.requested_by.is_none_or(|u| r.requested_by == u))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(paginate(&items, page))
    }

    async fn history(
        &self,
        attendance_log_id: Uuid,
    ) -> Result<Vec<RegularizationRequest>, AppError> {
        let mut items: Vec<RegularizationRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.attendance_log_id == attendance_log_id)
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn resolve(
        &self,
        id: Uuid,
        resolution: &Resolution,
    ) -> Result<Option<RegularizationRequest>, AppError> {
        let mut requests = self.requests.write().await;
        match requests.get_mut(&id) {
            Some(request) if request.status.is_pending() => {
                request.status = resolution.status;
                request.approved_by = Some(resolution.approved_by);
                request.approved_by_name = Some(resolution.approved_by_name.clone());
                request.approval_reason = resolution.approval_reason.clone();
                request.approved_at = Some(resolution.approved_at);
                request.updated_at = Utc::now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }
}
