use chrono::{Local, NaiveDateTime};
use domain_users::UserRepository;
use std::sync::Arc;
use validator::Validate;

use super::{non_blank, resolve_user};
use crate::error::{ProjectError, ProjectResult};
use crate::models::{CreateTask, NewTask, Status, Task, TaskChanges, TaskResponse, UpdateTask};
use crate::repository::{ProjectRepository, StatusRepository, TaskRepository};

/// Service layer for Task business logic.
///
/// Requests name their status by label; the service resolves the label
/// within the task's project before anything is written.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    projects: Arc<dyn ProjectRepository>,
    statuses: Arc<dyn StatusRepository>,
    users: Arc<dyn UserRepository>,
}

fn check_dates(start: NaiveDateTime, end: NaiveDateTime) -> ProjectResult<()> {
    if end < start {
        return Err(ProjectError::Validation(
            "endDate must not be before startDate".to_string(),
        ));
    }
    Ok(())
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        projects: Arc<dyn ProjectRepository>,
        statuses: Arc<dyn StatusRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            tasks,
            projects,
            statuses,
            users,
        }
    }

    pub async fn create(&self, input: CreateTask) -> ProjectResult<TaskResponse> {
        input
            .validate()
            .map_err(|e| ProjectError::Validation(e.to_string()))?;
        non_blank("title", &input.title)?;

        let project = self
            .projects
            .get_by_id(input.project_id)
            .await?
            .ok_or(ProjectError::ProjectNotFound(input.project_id))?;
        let status = self.resolve_status(project.id, &input.status).await?;
        let assigner = resolve_user(self.users.as_ref(), input.assigner_id).await?;

        let start_date = input
            .start_date
            .unwrap_or_else(|| Local::now().naive_local());
        check_dates(start_date, input.end_date)?;

        let new_task = NewTask {
            title: input.title,
            description: input.description,
            start_date,
            end_date: input.end_date,
            status_id: status.id,
            project_id: project.id,
            assigner_id: assigner.id,
        };
        let id = self.tasks.create(new_task.clone()).await?;

        let task = Task {
            id,
            title: new_task.title,
            description: new_task.description,
            start_date: new_task.start_date,
            end_date: new_task.end_date,
            status_id: new_task.status_id,
            project_id: new_task.project_id,
            assigner_id: new_task.assigner_id,
        };
        Ok(TaskResponse::new(task, status.name))
    }

    pub async fn get(&self, id: i32) -> ProjectResult<Option<TaskResponse>> {
        let Some(task) = self.tasks.get_by_id(id).await? else {
            tracing::debug!(task_id = id, "Task not found");
            return Ok(None);
        };

        let status = self.status_name(task.status_id).await?;
        Ok(Some(TaskResponse::new(task, status)))
    }

    /// Apply the supplied fields. A new status label is resolved within the
    /// task's own project; date ordering is checked against the merged result.
    pub async fn update(&self, id: i32, input: UpdateTask) -> ProjectResult<TaskResponse> {
        input
            .validate()
            .map_err(|e| ProjectError::Validation(e.to_string()))?;
        if let Some(title) = &input.title {
            non_blank("title", title)?;
        }

        let existing = self
            .tasks
            .get_by_id(id)
            .await?
            .ok_or(ProjectError::TaskNotFound(id))?;

        let status = match &input.status {
            Some(name) => Some(self.resolve_status(existing.project_id, name).await?),
            None => None,
        };

        if let Some(assigner_id) = input.assigner_id {
            resolve_user(self.users.as_ref(), assigner_id).await?;
        }

        let changes = TaskChanges {
            title: input.title,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            status_id: status.as_ref().map(|s| s.id),
            assigner_id: input.assigner_id,
        };

        let merged = existing.with_changes(&changes);
        check_dates(merged.start_date, merged.end_date)?;

        let updated = self
            .tasks
            .update(id, changes)
            .await?
            .ok_or(ProjectError::TaskNotFound(id))?;

        let status = match status {
            Some(status) => status.name,
            None => self.status_name(updated.status_id).await?,
        };
        Ok(TaskResponse::new(updated, status))
    }

    /// Whether a task was removed
    pub async fn remove(&self, id: i32) -> ProjectResult<bool> {
        Ok(self.tasks.delete(id).await?.is_some())
    }

    async fn resolve_status(&self, project_id: i32, name: &str) -> ProjectResult<Status> {
        self.statuses
            .get_by_key(project_id, name)
            .await?
            .ok_or_else(|| ProjectError::StatusNotFound {
                project_id,
                name: name.to_string(),
            })
    }

    async fn status_name(&self, status_id: i32) -> ProjectResult<String> {
        self.statuses
            .get_by_id(status_id)
            .await?
            .map(|s| s.name)
            .ok_or_else(|| ProjectError::Internal(format!("Status {} vanished", status_id)))
    }
}
