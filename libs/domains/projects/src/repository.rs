use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProjectError, ProjectResult};
use crate::models::{
    NewProject, NewStatus, NewTask, Project, ProjectChanges, Status, Task, TaskChanges,
};

/// Repository trait for Project persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Every project, ordered by id
    async fn get_all(&self) -> ProjectResult<Vec<Project>>;

    /// Get a project, with its member set, by ID
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Project>>;

    /// Projects whose member set contains `member_id`, ordered by id
    async fn get_by_foreign_key(&self, member_id: i32) -> ProjectResult<Vec<Project>>;

    /// Store a project and its memberships atomically, returning the new id
    async fn create(&self, project: NewProject) -> ProjectResult<i32>;

    /// Apply `changes`; `None` when the project does not exist
    async fn update(&self, id: i32, changes: ProjectChanges) -> ProjectResult<Option<Project>>;

    /// Delete a project together with its statuses and tasks
    async fn delete(&self, id: i32) -> ProjectResult<Option<Project>>;
}

/// Repository trait for Status persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Status>>;

    /// Look a status up by name within one project
    async fn get_by_key(&self, project_id: i32, name: &str) -> ProjectResult<Option<Status>>;

    /// All statuses of a project, ordered by id
    async fn get_by_foreign_key(&self, project_id: i32) -> ProjectResult<Vec<Status>>;

    /// Fails with `DuplicateStatus` when the name is taken in that project
    async fn create(&self, status: NewStatus) -> ProjectResult<i32>;

    /// Fails with `StatusInUse` while tasks still reference the status
    async fn delete(&self, id: i32) -> ProjectResult<Option<Status>>;
}

/// Repository trait for Task persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Task>>;

    /// All tasks of a project, ordered by id
    async fn get_by_foreign_key(&self, project_id: i32) -> ProjectResult<Vec<Task>>;

    async fn create(&self, task: NewTask) -> ProjectResult<i32>;

    async fn update(&self, id: i32, changes: TaskChanges) -> ProjectResult<Option<Task>>;

    async fn delete(&self, id: i32) -> ProjectResult<Option<Task>>;
}

// ============================================================================
// In-memory implementation (for development/testing)
// ============================================================================

#[derive(Debug, Default)]
struct Tables {
    projects: HashMap<i32, Project>,
    statuses: HashMap<i32, Status>,
    tasks: HashMap<i32, Task>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

fn sorted_by_id<T>(rows: impl Iterator<Item = (i32, T)>) -> Vec<T> {
    let mut rows: Vec<(i32, T)> = rows.collect();
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Shared in-memory tables behind the three in-memory repositories.
///
/// Keeping them in one place lets project deletion cascade to statuses and
/// tasks, and lets status deletion refuse while tasks still point at it, the
/// same way the foreign keys behave in PostgreSQL.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> InMemoryProjectRepository {
        InMemoryProjectRepository {
            store: self.clone(),
        }
    }

    pub fn statuses(&self) -> InMemoryStatusRepository {
        InMemoryStatusRepository {
            store: self.clone(),
        }
    }

    pub fn tasks(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            store: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryProjectRepository {
    store: InMemoryStore,
}

#[derive(Debug, Clone)]
pub struct InMemoryStatusRepository {
    store: InMemoryStore,
}

#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    store: InMemoryStore,
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn get_all(&self) -> ProjectResult<Vec<Project>> {
        let tables = self.store.tables.read().await;
        Ok(sorted_by_id(tables.projects.iter().map(|(id, p)| (*id, p.clone()))))
    }

    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Project>> {
        let tables = self.store.tables.read().await;
        Ok(tables.projects.get(&id).cloned())
    }

    async fn get_by_foreign_key(&self, member_id: i32) -> ProjectResult<Vec<Project>> {
        let tables = self.store.tables.read().await;
        Ok(sorted_by_id(
            tables
                .projects
                .iter()
                .filter(|(_, p)| p.member_ids.contains(&member_id))
                .map(|(id, p)| (*id, p.clone())),
        ))
    }

    async fn create(&self, project: NewProject) -> ProjectResult<i32> {
        let mut tables = self.store.tables.write().await;
        let id = tables.next_id();
        let now = Utc::now();

        tables.projects.insert(
            id,
            Project {
                id,
                name: project.name,
                member_ids: project.member_ids,
                created_at: now,
                updated_at: now,
            },
        );

        tracing::info!(project_id = id, "Created project");
        Ok(id)
    }

    async fn update(&self, id: i32, changes: ProjectChanges) -> ProjectResult<Option<Project>> {
        let mut tables = self.store.tables.write().await;

        let Some(project) = tables.projects.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(member_ids) = changes.member_ids {
            project.member_ids = member_ids;
        }
        project.updated_at = Utc::now();

        tracing::info!(project_id = id, "Updated project");
        Ok(Some(project.clone()))
    }

    async fn delete(&self, id: i32) -> ProjectResult<Option<Project>> {
        let mut tables = self.store.tables.write().await;

        let Some(project) = tables.projects.remove(&id) else {
            return Ok(None);
        };

        tables.tasks.retain(|_, t| t.project_id != id);
        tables.statuses.retain(|_, s| s.project_id != id);

        tracing::info!(project_id = id, "Deleted project");
        Ok(Some(project))
    }
}

#[async_trait]
impl StatusRepository for InMemoryStatusRepository {
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Status>> {
        let tables = self.store.tables.read().await;
        Ok(tables.statuses.get(&id).cloned())
    }

    async fn get_by_key(&self, project_id: i32, name: &str) -> ProjectResult<Option<Status>> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .statuses
            .values()
            .find(|s| s.project_id == project_id && s.name == name)
            .cloned())
    }

    async fn get_by_foreign_key(&self, project_id: i32) -> ProjectResult<Vec<Status>> {
        let tables = self.store.tables.read().await;
        Ok(sorted_by_id(
            tables
                .statuses
                .iter()
                .filter(|(_, s)| s.project_id == project_id)
                .map(|(id, s)| (*id, s.clone())),
        ))
    }

    async fn create(&self, status: NewStatus) -> ProjectResult<i32> {
        let mut tables = self.store.tables.write().await;

        if !tables.projects.contains_key(&status.project_id) {
            return Err(ProjectError::ProjectNotFound(status.project_id));
        }

        let taken = tables
            .statuses
            .values()
            .any(|s| s.project_id == status.project_id && s.name == status.name);
        if taken {
            return Err(ProjectError::DuplicateStatus(status.name));
        }

        let id = tables.next_id();
        tables.statuses.insert(
            id,
            Status {
                id,
                name: status.name,
                project_id: status.project_id,
            },
        );

        tracing::info!(status_id = id, "Created status");
        Ok(id)
    }

    async fn delete(&self, id: i32) -> ProjectResult<Option<Status>> {
        let mut tables = self.store.tables.write().await;

        if !tables.statuses.contains_key(&id) {
            return Ok(None);
        }
        if tables.tasks.values().any(|t| t.status_id == id) {
            return Err(ProjectError::StatusInUse(id));
        }

        tracing::info!(status_id = id, "Deleted status");
        Ok(tables.statuses.remove(&id))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Task>> {
        let tables = self.store.tables.read().await;
        Ok(tables.tasks.get(&id).cloned())
    }

    async fn get_by_foreign_key(&self, project_id: i32) -> ProjectResult<Vec<Task>> {
        let tables = self.store.tables.read().await;
        Ok(sorted_by_id(
            tables
                .tasks
                .iter()
                .filter(|(_, t)| t.project_id == project_id)
                .map(|(id, t)| (*id, t.clone())),
        ))
    }

    async fn create(&self, task: NewTask) -> ProjectResult<i32> {
        let mut tables = self.store.tables.write().await;
        let id = tables.next_id();

        tables.tasks.insert(
            id,
            Task {
                id,
                title: task.title,
                description: task.description,
                start_date: task.start_date,
                end_date: task.end_date,
                status_id: task.status_id,
                project_id: task.project_id,
                assigner_id: task.assigner_id,
            },
        );

        tracing::info!(task_id = id, "Created task");
        Ok(id)
    }

    async fn update(&self, id: i32, changes: TaskChanges) -> ProjectResult<Option<Task>> {
        let mut tables = self.store.tables.write().await;

        let Some(task) = tables.tasks.get_mut(&id) else {
            return Ok(None);
        };

        *task = task.with_changes(&changes);

        tracing::info!(task_id = id, "Updated task");
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i32) -> ProjectResult<Option<Task>> {
        let mut tables = self.store.tables.write().await;
        let removed = tables.tasks.remove(&id);

        if removed.is_some() {
            tracing::info!(task_id = id, "Deleted task");
        }
        Ok(removed)
    }
}
