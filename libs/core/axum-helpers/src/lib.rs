//! # Axum Helpers
//!
//! Shared HTTP plumbing for the Sensei services.
//!
//! - **[`auth`]**: stateless JWT issuance, verification and middleware
//! - **[`server`]**: router assembly with OpenAPI UIs, health checks, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: the `AppError` envelope and error codes
//! - **[`extractors`]**: `IdPath`, `ValidatedJson`, `CurrentUser`
//! - **[`audit`]**: audit trail on the `audit` target
//!
//! ```ignore
//! use axum_helpers::server::{create_app, create_router};
//! use core_config::server::ServerConfig;
//!
//! let router = create_router::<ApiDoc>(api_routes)?;
//! create_app(router, &ServerConfig::default()).await?;
//! ```

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_app, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{CurrentUser, IdPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
