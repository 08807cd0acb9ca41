use sea_orm::entity::prelude::*;
use std::collections::BTreeSet;

use crate::models::Project;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_member::Entity")]
    ProjectMember,
    #[sea_orm(has_many = "super::status::Entity")]
    Status,
    #[sea_orm(has_many = "super::task::Entity")]
    Task,
}

impl Related<super::project_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectMember.def()
    }
}

impl Related<super::status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Joins the row with its membership set.
    pub fn into_project(self, member_ids: BTreeSet<i32>) -> Project {
        Project {
            id: self.id,
            name: self.name,
            member_ids,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        }
    }
}
