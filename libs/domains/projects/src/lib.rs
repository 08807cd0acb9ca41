//! Projects Domain
//!
//! Projects, their per-project statuses and the tasks inside them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /project, /project/{id}/statuses, /project/tasks
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← ProjectService, StatusService, TaskService
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← traits + in-memory store and PostgreSQL implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Project, Status, Task, DTOs
//! └─────────────┘
//! ```
//!
//! Members and assigners are users from [`domain_users`]; every reference is
//! checked through a `UserRepository` before anything is stored.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_projects::{handlers, InMemoryStore};
//! use domain_users::InMemoryUserRepository;
//!
//! let store = InMemoryStore::new();
//! let state = handlers::ProjectsState::new(
//!     Arc::new(store.projects()),
//!     Arc::new(store.statuses()),
//!     Arc::new(store.tasks()),
//!     Arc::new(InMemoryUserRepository::new()),
//! );
//! let router = handlers::router(state);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{ProjectError, ProjectResult};
pub use handlers::{ApiDoc, ProjectsState};
pub use models::{
    CreateProject, CreateStatus, CreateTask, NewProject, NewStatus, NewTask, Project,
    ProjectChanges, ProjectResponse, Status, StatusResponse, Task, TaskChanges, TaskResponse,
    UpdateProject, UpdateTask,
};
pub use postgres::{PgProjectRepository, PgStatusRepository, PgTaskRepository};
pub use repository::{
    InMemoryProjectRepository, InMemoryStatusRepository, InMemoryStore, InMemoryTaskRepository,
    ProjectRepository, StatusRepository, TaskRepository,
};
pub use service::{ProjectService, StatusService, TaskService};
