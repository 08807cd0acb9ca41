//! Users Domain
//!
//! Registration, credential checks and user lookups for the rest of the
//! workspace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /auth/register, /auth/login
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Argon2 hashing, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← trait + in-memory and PostgreSQL implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, Role, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{handlers, repository::InMemoryUserRepository, service::UserService};
//!
//! let jwt = JwtAuth::new(&JwtConfig::new("a-secret-of-at-least-thirty-two-chars").unwrap());
//! let service = UserService::new(InMemoryUserRepository::new());
//! let router = handlers::router(handlers::AuthState::new(service, jwt));
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{AuthResponse, LoginUser, NewUser, RegisterUser, Role, User, UserResponse};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;

#[cfg(any(test, feature = "mock"))]
pub use repository::MockUserRepository;
