use domain_users::{User, UserRepository, UserResponse};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::{non_blank, resolve_user};
use crate::error::{ProjectError, ProjectResult};
use crate::models::{
    CreateProject, NewProject, Project, ProjectChanges, ProjectResponse, TaskResponse,
    UpdateProject,
};
use crate::repository::{ProjectRepository, StatusRepository, TaskRepository};

/// Service layer for Project business logic
#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    statuses: Arc<dyn StatusRepository>,
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        statuses: Arc<dyn StatusRepository>,
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            projects,
            statuses,
            tasks,
            users,
        }
    }

    /// Create a project with exactly the given members. Every member id must
    /// name an existing user.
    pub async fn create(&self, input: CreateProject) -> ProjectResult<ProjectResponse> {
        non_blank("name", &input.name)?;

        let members = self.resolve_members(&input.member_ids).await?;
        let member_ids = members.iter().map(|u| u.id).collect();

        let id = self
            .projects
            .create(NewProject {
                name: input.name.clone(),
                member_ids,
            })
            .await?;

        Ok(ProjectResponse {
            id,
            name: input.name,
            members: members.into_iter().map(UserResponse::from).collect(),
            tasks: None,
        })
    }

    /// Project details including its tasks
    pub async fn get(&self, id: i32) -> ProjectResult<Option<ProjectResponse>> {
        let Some(project) = self.projects.get_by_id(id).await? else {
            tracing::debug!(project_id = id, "Project not found");
            return Ok(None);
        };

        let tasks = self.tasks_of(project.id).await?;
        let mut response = self.to_response(project).await?;
        response.tasks = Some(tasks);

        Ok(Some(response))
    }

    /// Every project, without tasks
    pub async fn list_all(&self) -> ProjectResult<Vec<ProjectResponse>> {
        let projects = self.projects.get_all().await?;
        self.to_responses(projects).await
    }

    /// Projects the user is a member of, without tasks
    pub async fn list_for_member(&self, user_id: i32) -> ProjectResult<Vec<ProjectResponse>> {
        let projects = self.projects.get_by_foreign_key(user_id).await?;
        self.to_responses(projects).await
    }

    async fn to_responses(&self, projects: Vec<Project>) -> ProjectResult<Vec<ProjectResponse>> {
        let mut responses = Vec::with_capacity(projects.len());
        for project in projects {
            responses.push(self.to_response(project).await?);
        }
        Ok(responses)
    }

    /// Replace the name and/or member set; `None` if the project is unknown
    pub async fn update(
        &self,
        id: i32,
        input: UpdateProject,
    ) -> ProjectResult<Option<ProjectResponse>> {
        if self.projects.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        if let Some(name) = &input.name {
            non_blank("name", name)?;
        }

        let member_ids = match &input.member_ids {
            Some(ids) => Some(
                self.resolve_members(ids)
                    .await?
                    .iter()
                    .map(|u| u.id)
                    .collect(),
            ),
            None => None,
        };

        let changes = ProjectChanges {
            name: input.name,
            member_ids,
        };

        match self.projects.update(id, changes).await? {
            Some(project) => Ok(Some(self.to_response(project).await?)),
            None => Ok(None),
        }
    }

    /// Whether a project was removed
    pub async fn remove(&self, id: i32) -> ProjectResult<bool> {
        Ok(self.projects.delete(id).await?.is_some())
    }

    /// Looks every id up once, in ascending id order.
    async fn resolve_members(&self, ids: &[i32]) -> ProjectResult<Vec<User>> {
        let unique: BTreeSet<i32> = ids.iter().copied().collect();

        let mut members = Vec::with_capacity(unique.len());
        for id in unique {
            members.push(resolve_user(self.users.as_ref(), id).await?);
        }
        Ok(members)
    }

    async fn to_response(&self, project: Project) -> ProjectResult<ProjectResponse> {
        let mut members = Vec::with_capacity(project.member_ids.len());
        for &user_id in &project.member_ids {
            match self.users.get_by_id(user_id).await? {
                Some(user) => members.push(UserResponse::from(user)),
                None => {
                    tracing::warn!(project_id = project.id, user_id, "Member no longer exists")
                }
            }
        }

        Ok(ProjectResponse {
            id: project.id,
            name: project.name,
            members,
            tasks: None,
        })
    }

    async fn tasks_of(&self, project_id: i32) -> ProjectResult<Vec<TaskResponse>> {
        let names: HashMap<i32, String> = self
            .statuses
            .get_by_foreign_key(project_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        self.tasks
            .get_by_foreign_key(project_id)
            .await?
            .into_iter()
            .map(|task| {
                let status = names.get(&task.status_id).cloned().ok_or_else(|| {
                    ProjectError::Internal(format!(
                        "Task {} points at status {} outside project {}",
                        task.id, task.status_id, project_id
                    ))
                })?;
                Ok(TaskResponse::new(task, status))
            })
            .collect()
    }
}
