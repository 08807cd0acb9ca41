use async_trait::async_trait;
use database::{BaseRepository, is_unique_violation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{NewUser, User},
    repository::UserRepository,
};

#[derive(Clone)]
pub struct PgUserRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_key(&self, name: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Name.eq(name))
            .one(self.base.db())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn create(&self, user: NewUser) -> UserResult<i32> {
        let name = user.name.clone();

        let model = self.base.insert(user.into()).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateName(name)
            } else {
                e.into()
            }
        })?;

        tracing::info!(user_id = model.id, "Created user");
        Ok(model.id)
    }
}
