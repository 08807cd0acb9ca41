use std::sync::Arc;
use validator::Validate;

use super::non_blank;
use crate::error::{ProjectError, ProjectResult};
use crate::models::{CreateStatus, NewStatus, StatusResponse};
use crate::repository::{ProjectRepository, StatusRepository};

/// Per-project task statuses
#[derive(Clone)]
pub struct StatusService {
    statuses: Arc<dyn StatusRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl StatusService {
    pub fn new(statuses: Arc<dyn StatusRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { statuses, projects }
    }

    /// Add a status to a project; names are unique within the project
    pub async fn create(&self, project_id: i32, input: CreateStatus) -> ProjectResult<StatusResponse> {
        input
            .validate()
            .map_err(|e| ProjectError::Validation(e.to_string()))?;
        non_blank("name", &input.name)?;

        self.require_project(project_id).await?;

        let id = self
            .statuses
            .create(NewStatus {
                name: input.name.clone(),
                project_id,
            })
            .await?;

        Ok(StatusResponse {
            id,
            name: input.name,
            project_id,
        })
    }

    pub async fn list(&self, project_id: i32) -> ProjectResult<Vec<StatusResponse>> {
        self.require_project(project_id).await?;

        let statuses = self.statuses.get_by_foreign_key(project_id).await?;
        Ok(statuses.into_iter().map(StatusResponse::from).collect())
    }

    /// Whether a status was removed. Statuses still used by tasks stay.
    pub async fn remove(&self, id: i32) -> ProjectResult<bool> {
        Ok(self.statuses.delete(id).await?.is_some())
    }

    async fn require_project(&self, project_id: i32) -> ProjectResult<()> {
        match self.projects.get_by_id(project_id).await? {
            Some(_) => Ok(()),
            None => Err(ProjectError::ProjectNotFound(project_id)),
        }
    }
}
