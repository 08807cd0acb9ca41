use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, CurrentUser, IdPath, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_users::UserRepository;
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProjectError;
use crate::repository::{ProjectRepository, StatusRepository, TaskRepository};
use crate::models::{
    CreateProject, CreateStatus, CreateTask, ProjectResponse, StatusResponse, TaskResponse,
    UpdateProject, UpdateTask,
};
use crate::service::{ProjectService, StatusService, TaskService};

const TAG: &str = "project";

/// OpenAPI documentation for the project, status and task endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        list_projects,
        create_project,
        get_project,
        update_project,
        delete_project,
        list_statuses,
        create_status,
        delete_status,
        create_task,
        get_task,
        update_task,
        delete_task,
    ),
    components(
        schemas(
            CreateProject,
            UpdateProject,
            ProjectResponse,
            CreateStatus,
            StatusResponse,
            CreateTask,
            UpdateTask,
            TaskResponse,
            domain_users::UserResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Projects with their statuses and tasks")
    )
)]
pub struct ApiDoc;

/// Services behind the `/project` routes
#[derive(Clone)]
pub struct ProjectsState {
    pub projects: ProjectService,
    pub statuses: StatusService,
    pub tasks: TaskService,
}

impl ProjectsState {
    /// Wire the three services over one set of repositories.
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        statuses: Arc<dyn StatusRepository>,
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            projects: ProjectService::new(
                projects.clone(),
                statuses.clone(),
                tasks.clone(),
                users.clone(),
            ),
            statuses: StatusService::new(statuses.clone(), projects.clone()),
            tasks: TaskService::new(tasks, projects, statuses, users),
        }
    }
}

/// Create the project router. Every route expects the JWT middleware in front
/// of it; without one `CurrentUser` answers 401.
pub fn router(state: ProjectsState) -> Router {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/{id}/statuses", get(list_statuses).post(create_status))
        .route("/statuses/{id}", delete(delete_status))
        .route("/tasks", post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .with_state(state)
}

// ============================================================================
// Projects
// ============================================================================

/// Projects the caller is a member of; administrators see every project
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Projects visible to the caller", body = Vec<ProjectResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_projects(
    State(state): State<ProjectsState>,
    user: CurrentUser,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = if user.0.is_admin() {
        state.projects.list_all().await?
    } else {
        state.projects.list_for_member(user.id()?).await?
    };
    Ok(Json(projects))
}

/// Create a project; the caller always becomes a member
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    security(("bearer_auth" = [])),
    request_body = CreateProject,
    responses(
        (status = 200, description = "Project created", body = ProjectResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_project(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    ValidatedJson(mut input): ValidatedJson<CreateProject>,
) -> Result<Json<ProjectResponse>, AppError> {
    let user_id = user.id()?;
    input.member_ids.push(user_id);

    let project = state.projects.create(input).await?;

    AuditEvent::new(Some(user_id), "project.create", AuditOutcome::Success)
        .with_resource(format!("project:{}", project.id))
        .with_request(&headers)
        .with_details(json!({
            "name": project.name,
            "members": project.members.iter().map(|m| m.id).collect::<Vec<_>>(),
        }))
        .log();

    Ok(Json(project))
}

/// Project details with its tasks
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project found", body = ProjectResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_project(
    State(state): State<ProjectsState>,
    _user: CurrentUser,
    IdPath(id): IdPath,
) -> Result<Json<ProjectResponse>, AppError> {
    state
        .projects
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ProjectError::ProjectNotFound(id).into())
}

/// Rename a project or replace its members
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Project ID")
    ),
    request_body = UpdateProject,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_project(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateProject>,
) -> Result<Json<ProjectResponse>, AppError> {
    let Some(project) = state.projects.update(id, input).await? else {
        return Err(ProjectError::ProjectNotFound(id).into());
    };

    AuditEvent::new(user.0.user_id(), "project.update", AuditOutcome::Success)
        .with_resource(format!("project:{}", id))
        .with_request(&headers)
        .log();

    Ok(Json(project))
}

/// Delete a project together with its statuses and tasks
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_project(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !state.projects.remove(id).await? {
        return Err(ProjectError::ProjectNotFound(id).into());
    }

    AuditEvent::new(user.0.user_id(), "project.delete", AuditOutcome::Success)
        .with_resource(format!("project:{}", id))
        .with_request(&headers)
        .log();

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Statuses
// ============================================================================

#[utoipa::path(
    get,
    path = "/{id}/statuses",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Statuses of the project", body = Vec<StatusResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_statuses(
    State(state): State<ProjectsState>,
    _user: CurrentUser,
    IdPath(project_id): IdPath,
) -> Result<Json<Vec<StatusResponse>>, AppError> {
    Ok(Json(state.statuses.list(project_id).await?))
}

/// Add a status to a project
#[utoipa::path(
    post,
    path = "/{id}/statuses",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Project ID")
    ),
    request_body = CreateStatus,
    responses(
        (status = 200, description = "Status created", body = StatusResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_status(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    IdPath(project_id): IdPath,
    ValidatedJson(input): ValidatedJson<CreateStatus>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.statuses.create(project_id, input).await?;

    AuditEvent::new(user.0.user_id(), "status.create", AuditOutcome::Success)
        .with_resource(format!("status:{}", status.id))
        .with_request(&headers)
        .with_details(json!({ "project_id": project_id, "name": status.name }))
        .log();

    Ok(Json(status))
}

/// Delete a status that no task uses
#[utoipa::path(
    delete,
    path = "/statuses/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Status ID")
    ),
    responses(
        (status = 204, description = "Status deleted"),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_status(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !state.statuses.remove(id).await? {
        return Err(ProjectError::StatusIdNotFound(id).into());
    }

    AuditEvent::new(user.0.user_id(), "status.delete", AuditOutcome::Success)
        .with_resource(format!("status:{}", id))
        .with_request(&headers)
        .log();

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tasks
// ============================================================================

/// Create a task in a project
#[utoipa::path(
    post,
    path = "/tasks",
    tag = TAG,
    security(("bearer_auth" = [])),
    request_body = CreateTask,
    responses(
        (status = 200, description = "Task created", body = TaskResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_task(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateTask>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = state.tasks.create(input).await?;

    AuditEvent::new(user.0.user_id(), "task.create", AuditOutcome::Success)
        .with_resource(format!("task:{}", task.id))
        .with_request(&headers)
        .with_details(json!({ "project_id": task.project_id, "status": task.status }))
        .log();

    Ok(Json(task))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = TaskResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_task(
    State(state): State<ProjectsState>,
    _user: CurrentUser,
    IdPath(id): IdPath,
) -> Result<Json<TaskResponse>, AppError> {
    state
        .tasks
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ProjectError::TaskNotFound(id).into())
}

/// Change any subset of a task's fields
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_task(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateTask>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = state.tasks.update(id, input).await?;

    AuditEvent::new(user.0.user_id(), "task.update", AuditOutcome::Success)
        .with_resource(format!("task:{}", id))
        .with_request(&headers)
        .log();

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_task(
    State(state): State<ProjectsState>,
    user: CurrentUser,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !state.tasks.remove(id).await? {
        return Err(ProjectError::TaskNotFound(id).into());
    }

    AuditEvent::new(user.0.user_id(), "task.delete", AuditOutcome::Success)
        .with_resource(format!("task:{}", id))
        .with_request(&headers)
        .log();

    Ok(StatusCode::NO_CONTENT)
}
