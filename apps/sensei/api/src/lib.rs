//! Sensei API
//!
//! Wires the users and projects domains into one HTTP service:
//!
//! - `/api/auth/*`: registration and login, public
//! - `/api/project/*`: projects, statuses and tasks, bearer token required
//! - `/health`, `/ready`, `/swagger-ui`
//!
//! The binary in `main.rs` runs it against PostgreSQL; tests build the same
//! routes over [`api::Repositories::in_memory`].

pub mod api;
pub mod config;
pub mod openapi;
pub mod state;

pub use config::Config;
pub use state::AppState;
