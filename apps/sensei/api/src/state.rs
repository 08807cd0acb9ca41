//! Shared application state.

use axum_helpers::JwtAuth;
use database::postgres::DatabaseConnection;

/// Cloned into the routers that need it; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: DatabaseConnection,
    pub jwt: JwtAuth,
}
