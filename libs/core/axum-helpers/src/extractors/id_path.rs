//! Integer id path parameter extractor.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Extractor for positive integer ids in the path (`/project/{id}`).
///
/// Anything that does not parse as a positive `i32` is rejected with a 400
/// before the handler runs.
///
/// ```ignore
/// use axum_helpers::extractors::IdPath;
///
/// async fn get_task(IdPath(id): IdPath) -> String {
///     format!("Task {}", id)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i32);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        parse_id(&raw)
            .map(IdPath)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid id: {}", raw)).into_response())
    }
}

fn parse_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().filter(|id| *id > 0)
}
