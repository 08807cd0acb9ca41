use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_users::UserError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project {0} not found")]
    ProjectNotFound(i32),

    #[error("Task {0} not found")]
    TaskNotFound(i32),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("Status {0} not found")]
    StatusIdNotFound(i32),

    #[error("Status '{name}' not found in project {project_id}")]
    StatusNotFound { project_id: i32, name: String },

    #[error("Status '{0}' already exists in this project")]
    DuplicateStatus(String),

    #[error("Status {0} is still used by tasks")]
    StatusInUse(i32),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProjectResult<T> = Result<T, ProjectError>;

impl From<DbErr> for ProjectError {
    fn from(err: DbErr) -> Self {
        ProjectError::Internal(format!("Database error: {}", err))
    }
}

/// User lookups made while resolving members and assigners.
impl From<UserError> for ProjectError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => ProjectError::UserNotFound(id),
            other => ProjectError::Internal(other.to_string()),
        }
    }
}

/// Convert ProjectError to AppError for standardized error responses
impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::ProjectNotFound(_)
            | ProjectError::TaskNotFound(_)
            | ProjectError::UserNotFound(_)
            | ProjectError::StatusIdNotFound(_)
            | ProjectError::StatusNotFound { .. } => AppError::NotFound(err.to_string()),
            ProjectError::DuplicateStatus(_) | ProjectError::StatusInUse(_) => {
                AppError::Conflict(err.to_string())
            }
            ProjectError::Validation(msg) => AppError::BadRequest(msg),
            ProjectError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProjectError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: ProjectError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(ProjectError::ProjectNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ProjectError::StatusNotFound {
                project_id: 1,
                name: "todo".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ProjectError::StatusIdNotFound(2)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ProjectError::DuplicateStatus("todo".to_string())), StatusCode::CONFLICT);
        assert_eq!(status_of(ProjectError::StatusInUse(3)), StatusCode::CONFLICT);
        assert_eq!(status_of(ProjectError::Validation("bad".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ProjectError::Internal("x".to_string())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_user_not_found_keeps_its_id() {
        let err: ProjectError = UserError::NotFound(9).into();
        assert!(matches!(err, ProjectError::UserNotFound(9)));
    }
}
