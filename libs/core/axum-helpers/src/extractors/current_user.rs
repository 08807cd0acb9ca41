//! Authenticated caller extractor.

use crate::{auth::JwtClaims, errors::AppError};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Claims of the authenticated caller, as stored by
/// [`jwt_auth_middleware`](crate::auth::jwt_auth_middleware).
///
/// Routes that use this extractor without the middleware in front of them
/// always answer 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub JwtClaims);

impl CurrentUser {
    /// Numeric id of the caller; 401 when `sub` is not one.
    pub fn id(&self) -> Result<i32, AppError> {
        self.0
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Token subject is not a user id".to_string()))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()).into_response())
    }
}
