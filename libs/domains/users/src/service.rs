use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{LoginUser, NewUser, RegisterUser, Role, User};
use crate::repository::UserRepository;

/// Service layer for User business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Register a new `USER` account with an Argon2-hashed password
    pub async fn register(&self, input: RegisterUser) -> UserResult<User> {
        input.validate()?;

        let password_hash = self.hash_password(&input.password)?;

        let id = self
            .repository
            .create(NewUser {
                name: input.name,
                password_hash,
                role: Role::User,
            })
            .await?;

        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::Internal(format!("User {} missing after insert", id)))
    }

    /// Check a name/password pair. Unknown names and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, input: LoginUser) -> UserResult<User> {
        input.validate()?;

        let user = self
            .repository
            .get_by_key(&input.name)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !self.verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i32) -> UserResult<Option<User>> {
        self.repository.get_by_id(id).await
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
