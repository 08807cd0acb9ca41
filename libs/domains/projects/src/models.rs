use chrono::{DateTime, NaiveDateTime, Utc};
use domain_users::UserResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;
use validator::Validate;

// ============================================================================
// Stored records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub member_ids: BTreeSet<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub member_ids: BTreeSet<i32>,
}

/// Fields to change on a project; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    /// Replaces the whole member set when present
    pub member_ids: Option<BTreeSet<i32>>,
}

/// A project-scoped task label such as "todo" or "done".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub id: i32,
    pub name: String,
    pub project_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatus {
    pub name: String,
    pub project_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub status_id: i32,
    pub project_id: i32,
    pub assigner_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub status_id: i32,
    pub project_id: i32,
    pub assigner_id: i32,
}

/// Already-resolved task changes. The project of a task never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub status_id: Option<i32>,
    pub assigner_id: Option<i32>,
}

impl Task {
    /// The task as it would look after `changes`, without touching storage.
    pub fn with_changes(&self, changes: &TaskChanges) -> Task {
        Task {
            id: self.id,
            title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            description: changes
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            start_date: changes.start_date.unwrap_or(self.start_date),
            end_date: changes.end_date.unwrap_or(self.end_date),
            status_id: changes.status_id.unwrap_or(self.status_id),
            project_id: self.project_id,
            assigner_id: changes.assigner_id.unwrap_or(self.assigner_id),
        }
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Website relaunch")]
    pub name: String,
    /// Users to add as members; the caller is always added
    #[serde(default)]
    pub member_ids: Vec<i32>,
}

/// Partial update; a missing key and `null` both mean "unchanged".
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Replaces the member set
    pub member_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatus {
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "todo")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the current time
    #[schema(value_type = Option<String>, example = "2024-05-01T09:00:00")]
    pub start_date: Option<NaiveDateTime>,
    #[schema(value_type = String, example = "2024-05-03T17:00:00")]
    pub end_date: NaiveDateTime,
    /// Status name, resolved within `projectId`
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "todo")]
    pub status: String,
    pub project_id: i32,
    pub assigner_id: i32,
}

/// Partial update; a missing key and `null` both mean "unchanged".
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub start_date: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub end_date: Option<NaiveDateTime>,
    /// Status name, resolved within the task's project
    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,
    pub assigner_id: Option<i32>,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: i32,
    pub name: String,
    pub members: Vec<UserResponse>,
    /// Present on the single-project view only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskResponse>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub id: i32,
    pub name: String,
    pub project_id: i32,
}

impl From<Status> for StatusResponse {
    fn from(status: Status) -> Self {
        Self {
            id: status.id,
            name: status.name,
            project_id: status.project_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub start_date: NaiveDateTime,
    #[schema(value_type = String)]
    pub end_date: NaiveDateTime,
    /// Status name
    pub status: String,
    pub project_id: i32,
    pub assigner_id: i32,
}

impl TaskResponse {
    pub fn new(task: Task, status: String) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            start_date: task.start_date,
            end_date: task.end_date,
            status,
            project_id: task.project_id,
            assigner_id: task.assigner_id,
        }
    }
}
