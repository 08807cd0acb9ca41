use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewUser, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        let role = model.role.parse().unwrap_or_else(|_| {
            tracing::warn!(user_id = model.id, role = %model.role, "Unknown role stored, treating as USER");
            Default::default()
        });

        Self {
            id: model.id,
            name: model.name,
            password_hash: model.password_hash,
            role,
            created_at: model.created_at.into(),
        }
    }
}

impl From<NewUser> for ActiveModel {
    fn from(input: NewUser) -> Self {
        ActiveModel {
            id: NotSet,
            name: Set(input.name),
            password_hash: Set(input.password_hash),
            role: Set(input.role.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
    }
}
