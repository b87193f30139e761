//! Regularization request store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::regularization::{RegularizationRequest, RegularizationStatus};

/// Filter for listing requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegularizationFilter {
    /// Restrict to one requester.
    pub requested_by: Option<Uuid>,
    pub status: Option<RegularizationStatus>,
}

/// Terminal transition payload for a pending request.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: RegularizationStatus,
    pub approved_by: Uuid,
    pub approved_by_name: String,
    pub approval_reason: Option<String>,
    pub approved_at: DateTime<Utc>,
}

/// Persistence of regularization requests.
#[async_trait]
pub trait RegularizationStore: Send + Sync + std::fmt::Debug {
    async fn create(&self, request: &RegularizationRequest)
    -> Result<RegularizationRequest, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RegularizationRequest>, AppError>;

    /// Page through requests, newest first.
    async fn list(
        &self,
        filter: &RegularizationFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<RegularizationRequest>, AppError>;

    /// All requests targeting a log, newest first.
    async fn history(&self, attendance_log_id: Uuid)
    -> Result<Vec<RegularizationRequest>, AppError>;

    /// Move a request out of `pending`.
    ///
    /// Compare-and-set: returns `None` when the request is absent or no
    /// longer pending.
    async fn resolve(
        &self,
        id: Uuid,
        resolution: &Resolution,
    ) -> Result<Option<RegularizationRequest>, AppError>;
}
