//! Stateless bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed with `JWT_SECRET`. They are issued by the
//! register/login handlers and checked by [`jwt_auth_middleware`], which
//! stores the decoded [`JwtClaims`] in the request extensions. Handlers read
//! the caller back through the [`CurrentUser`](crate::CurrentUser) extractor.
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let protected = Router::new()
//!     .route("/project", get(list_projects))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::jwt_auth_middleware;
