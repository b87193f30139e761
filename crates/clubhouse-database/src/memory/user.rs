//! In-memory user store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_entity::user::User;

use crate::store::user::UserStore;

/// Operator accounts held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict(format!("User '{}' already exists", user.username)));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_admins(&self) -> Result<Vec<User>, AppError> {
        let mut admins: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.is_active && u.role.is_admin())
            .cloned()
            .collect();
        admins.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(admins)
    }
}
