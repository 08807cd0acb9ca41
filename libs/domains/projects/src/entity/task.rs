use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewTask, Task, TaskChanges};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub status_id: i32,
    pub project_id: i32,
    pub assigner_id: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::status::Entity",
        from = "Column::StatusId",
        to = "super::status::Column::Id"
    )]
    Status,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Task {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            start_date: model.start_date,
            end_date: model.end_date,
            status_id: model.status_id,
            project_id: model.project_id,
            assigner_id: model.assigner_id,
        }
    }
}

impl From<NewTask> for ActiveModel {
    fn from(input: NewTask) -> Self {
        let now = chrono::Utc::now();

        ActiveModel {
            id: NotSet,
            title: Set(input.title),
            description: Set(input.description),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            status_id: Set(input.status_id),
            project_id: Set(input.project_id),
            assigner_id: Set(input.assigner_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}

impl ActiveModel {
    /// Writes the supplied fields; absent ones keep their stored value.
    pub fn apply(&mut self, changes: TaskChanges) {
        if let Some(title) = changes.title {
            self.title = Set(title);
        }
        if let Some(description) = changes.description {
            self.description = Set(description);
        }
        if let Some(start_date) = changes.start_date {
            self.start_date = Set(start_date);
        }
        if let Some(end_date) = changes.end_date {
            self.end_date = Set(end_date);
        }
        if let Some(status_id) = changes.status_id {
            self.status_id = Set(status_id);
        }
        if let Some(assigner_id) = changes.assigner_id {
            self.assigner_id = Set(assigner_id);
        }
        self.updated_at = Set(chrono::Utc::now().into());
    }
}
