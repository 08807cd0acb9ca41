//! Business logic over the project, status and task repositories.
//!
//! Services take their repositories as `Arc<dyn Trait>` so the same service
//! code runs against PostgreSQL, the in-memory store, or mocks.

mod project;
mod status;
mod task;

pub use project::ProjectService;
pub use status::StatusService;
pub use task::TaskService;

use domain_users::{User, UserRepository};

use crate::error::{ProjectError, ProjectResult};

/// Rejects names that are empty once surrounding whitespace is ignored.
fn non_blank(field: &str, value: &str) -> ProjectResult<()> {
    if value.trim().is_empty() {
        return Err(ProjectError::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}

async fn resolve_user(users: &dyn UserRepository, id: i32) -> ProjectResult<User> {
    users
        .get_by_id(id)
        .await?
        .ok_or(ProjectError::UserNotFound(id))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use domain_users::{Role, User};

    pub fn user(id: i32, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }
}
