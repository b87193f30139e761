//! In-memory store implementations using Tokio `RwLock`.
//!
//! Suitable for single-process development (`database.provider = "memory"`)
//! and tests. Data is lost on restart.

pub mod attendance;
pub mod machine;
pub mod notification;
pub mod regularization;
pub mod staff;
pub mod user;

pub use attendance::MemoryAttendanceLogStore;
pub use machine::MemoryMachineStore;
pub use notification::MemoryNotificationStore;
pub use regularization::MemoryRegularizationStore;
pub use staff::MemoryStaffStore;
pub use user::MemoryUserStore;

use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use serde::Serialize;

/// Slice a sorted vector into a page.
pub(crate) fn paginate<T: Serialize + Clone>(items: &[T], page: &PageRequest) -> PageResponse<T> {
    let total = items.len() as u64;
    let start = (page.offset() as usize).min(items.len());
    let end = (start + page.limit() as usize).min(items.len());
    PageResponse::new(items[start..end].to_vec(), page.page, page.page_size, total)
}
