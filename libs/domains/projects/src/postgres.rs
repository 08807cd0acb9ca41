use async_trait::async_trait;
use chrono::Utc;
use database::{
    BaseRepository, foreign_key_violation, is_foreign_key_violation, is_unique_violation,
};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};

use crate::{
    entity::{project, project_member, status, task},
    error::{ProjectError, ProjectResult},
    models::{NewProject, NewStatus, NewTask, Project, ProjectChanges, Status, Task, TaskChanges},
    repository::{ProjectRepository, StatusRepository, TaskRepository},
};

// ============================================================================
// Projects
// ============================================================================

#[derive(Clone)]
pub struct PgProjectRepository {
    base: BaseRepository<project::Entity>,
}

impl PgProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

/// Member sets keyed by project id.
async fn members_of<C: ConnectionTrait>(
    conn: &C,
    project_ids: &[i32],
) -> Result<HashMap<i32, BTreeSet<i32>>, DbErr> {
    let rows = project_member::Entity::find()
        .filter(project_member::Column::ProjectId.is_in(project_ids.iter().copied()))
        .all(conn)
        .await?;

    let mut members: HashMap<i32, BTreeSet<i32>> = HashMap::new();
    for row in rows {
        members.entry(row.project_id).or_default().insert(row.user_id);
    }
    Ok(members)
}

async fn insert_members(
    txn: &DatabaseTransaction,
    project_id: i32,
    member_ids: &BTreeSet<i32>,
) -> Result<(), DbErr> {
    if member_ids.is_empty() {
        return Ok(());
    }

    let rows = member_ids.iter().map(|&user_id| project_member::ActiveModel {
        project_id: Set(project_id),
        user_id: Set(user_id),
    });

    project_member::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await?;
    Ok(())
}

/// Maps a failed membership insert to the first member id with no user row.
async fn member_error(
    db: &DatabaseConnection,
    err: DbErr,
    member_ids: &BTreeSet<i32>,
) -> ProjectError {
    if !is_foreign_key_violation(&err) {
        return err.into();
    }

    let found = match domain_users::entity::Entity::find()
        .filter(domain_users::entity::Column::Id.is_in(member_ids.iter().copied()))
        .all(db)
        .await
    {
        Ok(rows) => rows.into_iter().map(|row| row.id).collect::<BTreeSet<i32>>(),
        Err(lookup) => return lookup.into(),
    };

    match member_ids.difference(&found).next() {
        Some(&missing) => ProjectError::UserNotFound(missing),
        None => err.into(),
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn get_all(&self) -> ProjectResult<Vec<Project>> {
        let mut models = self.base.find_all().await?;
        models.sort_by_key(|model| model.id);

        let ids: Vec<i32> = models.iter().map(|model| model.id).collect();
        let mut members = members_of(self.base.db(), &ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let member_ids = members.remove(&model.id).unwrap_or_default();
                model.into_project(member_ids)
            })
            .collect())
    }

    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Project>> {
        let Some(model) = self.base.find_by_id(id).await? else {
            return Ok(None);
        };

        let members = members_of(self.base.db(), &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(Some(model.into_project(members)))
    }

    async fn get_by_foreign_key(&self, member_id: i32) -> ProjectResult<Vec<Project>> {
        let db = self.base.db();

        let project_ids: Vec<i32> = project_member::Entity::find()
            .filter(project_member::Column::UserId.eq(member_id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.project_id)
            .collect();

        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = project::Entity::find()
            .filter(project::Column::Id.is_in(project_ids.iter().copied()))
            .order_by_asc(project::Column::Id)
            .all(db)
            .await?;

        let mut members = members_of(db, &project_ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let member_ids = members.remove(&model.id).unwrap_or_default();
                model.into_project(member_ids)
            })
            .collect())
    }

    async fn create(&self, input: NewProject) -> ProjectResult<i32> {
        let now = Utc::now();
        let txn = self.base.db().begin().await?;

        let model = project::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        if let Err(e) = insert_members(&txn, model.id, &input.member_ids).await {
            txn.rollback().await?;
            return Err(member_error(self.base.db(), e, &input.member_ids).await);
        }
        txn.commit().await?;

        tracing::info!(project_id = model.id, members = input.member_ids.len(), "Created project");
        Ok(model.id)
    }

    async fn update(&self, id: i32, changes: ProjectChanges) -> ProjectResult<Option<Project>> {
        let ProjectChanges { name, member_ids } = changes;
        let txn = self.base.db().begin().await?;

        let Some(existing) = project::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: project::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await?;

        if let Some(member_ids) = member_ids {
            project_member::Entity::delete_many()
                .filter(project_member::Column::ProjectId.eq(id))
                .exec(&txn)
                .await?;
            if let Err(e) = insert_members(&txn, id, &member_ids).await {
                txn.rollback().await?;
                return Err(member_error(self.base.db(), e, &member_ids).await);
            }
        }

        let members = members_of(&txn, &[id]).await?.remove(&id).unwrap_or_default();
        txn.commit().await?;

        tracing::info!(project_id = id, "Updated project");
        Ok(Some(model.into_project(members)))
    }

    async fn delete(&self, id: i32) -> ProjectResult<Option<Project>> {
        let txn = self.base.db().begin().await?;

        let Some(existing) = project::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };
        let members = members_of(&txn, &[id]).await?.remove(&id).unwrap_or_default();

        // memberships, statuses and tasks go with it via ON DELETE CASCADE
        project::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(project_id = id, "Deleted project");
        Ok(Some(existing.into_project(members)))
    }
}

// ============================================================================
// Statuses
// ============================================================================

#[derive(Clone)]
pub struct PgStatusRepository {
    base: BaseRepository<status::Entity>,
}

impl PgStatusRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl StatusRepository for PgStatusRepository {
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Status>> {
        Ok(self.base.find_by_id(id).await?.map(Into::into))
    }

    async fn get_by_key(&self, project_id: i32, name: &str) -> ProjectResult<Option<Status>> {
        let model = status::Entity::find()
            .filter(status::Column::ProjectId.eq(project_id))
            .filter(status::Column::Name.eq(name))
            .one(self.base.db())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn get_by_foreign_key(&self, project_id: i32) -> ProjectResult<Vec<Status>> {
        let models = status::Entity::find()
            .filter(status::Column::ProjectId.eq(project_id))
            .order_by_asc(status::Column::Id)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create(&self, input: NewStatus) -> ProjectResult<i32> {
        let name = input.name.clone();
        let project_id = input.project_id;

        let model = self.base.insert(input.into()).await.map_err(|e| {
            if is_unique_violation(&e) {
                ProjectError::DuplicateStatus(name)
            } else if is_foreign_key_violation(&e) {
                ProjectError::ProjectNotFound(project_id)
            } else {
                e.into()
            }
        })?;

        tracing::info!(status_id = model.id, project_id, "Created status");
        Ok(model.id)
    }

    async fn delete(&self, id: i32) -> ProjectResult<Option<Status>> {
        let removed = self.base.delete_by_id(id).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                ProjectError::StatusInUse(id)
            } else {
                e.into()
            }
        })?;

        if removed.is_some() {
            tracing::info!(status_id = id, "Deleted status");
        }
        Ok(removed.map(Into::into))
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// Rows a task points at, for naming the one a foreign-key violation refers to.
#[derive(Default)]
struct TaskRefs {
    project_id: Option<i32>,
    status_id: Option<i32>,
    assigner_id: Option<i32>,
}

impl TaskRefs {
    fn error(&self, err: DbErr) -> ProjectError {
        let Some(message) = foreign_key_violation(&err) else {
            return err.into();
        };

        let missing = if message.contains("fk_tasks_project_id") {
            self.project_id.map(ProjectError::ProjectNotFound)
        } else if message.contains("fk_tasks_status_id") {
            self.status_id.map(ProjectError::StatusIdNotFound)
        } else if message.contains("fk_tasks_assigner_id") {
            self.assigner_id.map(ProjectError::UserNotFound)
        } else {
            None
        };
        missing.unwrap_or_else(|| err.into())
    }
}

#[derive(Clone)]
pub struct PgTaskRepository {
    base: BaseRepository<task::Entity>,
}

impl PgTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn get_by_id(&self, id: i32) -> ProjectResult<Option<Task>> {
        Ok(self.base.find_by_id(id).await?.map(Into::into))
    }

    async fn get_by_foreign_key(&self, project_id: i32) -> ProjectResult<Vec<Task>> {
        let models = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .order_by_asc(task::Column::Id)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create(&self, input: NewTask) -> ProjectResult<i32> {
        let refs = TaskRefs {
            project_id: Some(input.project_id),
            status_id: Some(input.status_id),
            assigner_id: Some(input.assigner_id),
        };
        let model = self
            .base
            .insert(input.into())
            .await
            .map_err(|e| refs.error(e))?;

        tracing::info!(task_id = model.id, project_id = model.project_id, "Created task");
        Ok(model.id)
    }

    async fn update(&self, id: i32, changes: TaskChanges) -> ProjectResult<Option<Task>> {
        let refs = TaskRefs {
            status_id: changes.status_id,
            assigner_id: changes.assigner_id,
            ..Default::default()
        };
        let updated = self
            .base
            .update_by_id(id, move |active| active.apply(changes))
            .await
            .map_err(|e| refs.error(e))?;

        if updated.is_some() {
            tracing::info!(task_id = id, "Updated task");
        }
        Ok(updated.map(Into::into))
    }

    async fn delete(&self, id: i32) -> ProjectResult<Option<Task>> {
        let removed = self.base.delete_by_id(id).await?;

        if removed.is_some() {
            tracing::info!(task_id = id, "Deleted task");
        }
        Ok(removed.map(Into::into))
    }
}
