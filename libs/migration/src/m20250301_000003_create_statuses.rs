use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000002_create_projects::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Statuses::Table)
                    .if_not_exists()
                    .col(pk_auto(Statuses::Id))
                    .col(string_len(Statuses::Name, 50))
                    .col(integer(Statuses::ProjectId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statuses_project_id")
                            .from(Statuses::Table, Statuses::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Status names are unique per project, not globally.
        manager
            .create_index(
                Index::create()
                    .name("uq_statuses_project_id_name")
                    .table(Statuses::Table)
                    .col(Statuses::ProjectId)
                    .col(Statuses::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Statuses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Statuses {
    Table,
    Id,
    Name,
    ProjectId,
}
