//! Generic CRUD over a sea-orm entity with an `i32` primary key.
//!
//! Domain repositories wrap a [`BaseRepository`] and add the lookups that are
//! specific to their entity (by natural key, by foreign key).
//!
//! ```ignore
//! pub struct PgStatusRepository {
//!     base: BaseRepository<status::Entity>,
//! }
//!
//! let found = self.base.find_by_id(id).await?;
//! let removed = self.base.delete_by_id(id).await?;
//! ```

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait, SqlErr, TransactionTrait,
};
use std::marker::PhantomData;

pub struct BaseRepository<E> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> BaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn find_all(&self) -> Result<Vec<E::Model>, DbErr> {
        E::find().all(&self.db).await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<E::Model>, DbErr> {
        E::find_by_id(id).one(&self.db).await
    }

    /// Inserts and returns the stored row, including its generated id.
    pub async fn insert(&self, model: E::ActiveModel) -> Result<E::Model, DbErr> {
        model.insert(&self.db).await
    }

    /// Loads row `id`, lets `apply` change it, and writes the changed columns
    /// back in one transaction. `None` when the row does not exist.
    pub async fn update_by_id<F>(&self, id: i32, apply: F) -> Result<Option<E::Model>, DbErr>
    where
        F: FnOnce(&mut E::ActiveModel) + Send,
    {
        let txn = self.db.begin().await?;

        let Some(existing) = E::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active = existing.into_active_model();
        apply(&mut active);

        let updated = if active.is_changed() {
            active.update(&txn).await?
        } else {
            E::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("row {} vanished during update", id)))?
        };

        txn.commit().await?;
        Ok(Some(updated))
    }

    /// Deletes row `id` and returns what was removed; `None` if it was absent.
    pub async fn delete_by_id(&self, id: i32) -> Result<Option<E::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(existing) = E::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        E::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(Some(existing))
    }
}

/// Whether `err` is a unique-key violation reported by the database.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Whether `err` is a foreign-key violation, e.g. deleting a row that is
/// still referenced.
pub fn is_foreign_key_violation(err: &DbErr) -> bool {
    foreign_key_violation(err).is_some()
}

/// The database's message for a foreign-key violation. PostgreSQL names the
/// violated constraint in it.
pub fn foreign_key_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(message)) => Some(message),
        _ => None,
    }
}
