//! User store trait.

use async_trait::async_trait;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_entity::user::User;

/// Read access to operator accounts.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn create(&self, user: &User) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Active superadmins and admins.
    async fn find_admins(&self) -> Result<Vec<User>, AppError>;
}
