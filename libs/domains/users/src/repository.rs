use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User};

/// Repository trait for User persistence
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by ID
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>>;

    /// Get a user by its unique name
    async fn get_by_key(&self, name: &str) -> UserResult<Option<User>>;

    /// Store a new user and return the generated id.
    /// Fails with `DuplicateName` when the name is taken.
    async fn create(&self, user: NewUser) -> UserResult<i32>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<i32, User>>>,
    next_id: Arc<AtomicI32>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_key(&self, name: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.name == name).cloned())
    }

    async fn create(&self, user: NewUser) -> UserResult<i32> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.name == user.name) {
            return Err(UserError::DuplicateName(user.name));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        users.insert(
            id,
            User {
                id,
                name: user.name,
                password_hash: user.password_hash,
                role: user.role,
                created_at: Utc::now(),
            },
        );

        tracing::info!(user_id = id, "Created user");
        Ok(id)
    }
}
